//! Roulette prize configuration.
//!
//! A prize slot (`LootBoxPrize`) is a weighted reference to a gift. Slots have
//! their own identity: one gift may sit in several slots with different chance
//! or color, so slot ids and gift ids are never interchangeable.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use giftshop_common::models::{ClientPrize, Gift, LootBoxPrize, LootBoxPrizeWithGift, PrizeEntryInput};
use giftshop_common::traits::repository_traits::{GiftRepository, PrizeRepository};
use giftshop_common::FieldErrors;

use crate::{Error, ShopConfig};

/// Tolerance for float noise when comparing the chance sum to its ceiling.
const CHANCE_EPSILON: f64 = 1e-9;

/// Flattens slots for the client. Gift fields keep the gift's id under `id`;
/// the slot's own id goes to `loot_box_prize_id`.
pub fn transform_prizes_to_client_format(prizes: &[LootBoxPrizeWithGift]) -> Vec<ClientPrize> {
    prizes
        .iter()
        .map(|p| ClientPrize {
            id: p.gift.id,
            name: p.gift.name.clone(),
            media_url: p.gift.media_url.clone(),
            price: p.gift.price,
            drop_chance: p.prize.drop_chance,
            color: p.prize.color.clone(),
            max_wins: p.prize.max_wins,
            current_wins: p.prize.current_wins,
            is_active: p.prize.is_active,
            loot_box_prize_id: p.prize.id,
        })
        .collect()
}

/// Sum of drop chances over active slots.
pub fn active_chance_sum<'a>(entries: impl IntoIterator<Item = &'a PrizeEntryInput>) -> f64 {
    entries
        .into_iter()
        .filter(|e| e.is_active)
        .map(|e| e.drop_chance)
        .sum()
}

/// Checks each slot on its own and the set as a whole. Gift existence is
/// checked separately since it needs the store.
pub fn validate_entries(entries: &[PrizeEntryInput], max_total: f64) -> FieldErrors {
    let mut errs = FieldErrors::new();
    let mut seen_ids = HashSet::new();

    for (i, e) in entries.iter().enumerate() {
        let field = |name: &str| format!("entries[{i}].{name}");

        if !e.drop_chance.is_finite() {
            errs.add(field("drop_chance"), "must be a number");
        } else if e.drop_chance < 0.0 {
            errs.add(field("drop_chance"), "must not be negative");
        }
        if e.color.trim().is_empty() {
            errs.add(field("color"), "is required");
        }
        if matches!(e.max_wins, Some(m) if m < 0) {
            errs.add(field("max_wins"), "must not be negative");
        }
        if e.current_wins < 0 {
            errs.add(field("current_wins"), "must not be negative");
        } else if matches!(e.max_wins, Some(m) if e.current_wins > m) {
            errs.add(field("current_wins"), "must not exceed max_wins");
        }
        if let Some(id) = e.loot_box_prize_id {
            if !seen_ids.insert(id) {
                errs.add(field("loot_box_prize_id"), "appears more than once");
            }
        }
    }

    let sum = active_chance_sum(entries);
    // An overflowing sum is +inf and still lands here; NaN is reported per entry.
    if sum > max_total + CHANCE_EPSILON {
        errs.add(
            "entries",
            format!("active drop chances sum to {sum}%, above the {max_total}% maximum"),
        );
    }
    errs
}

pub struct RouletteService {
    prize_repo: Arc<dyn PrizeRepository>,
    gift_repo: Arc<dyn GiftRepository>,
    config: ShopConfig,
}

impl RouletteService {
    pub fn new(
        prize_repo: Arc<dyn PrizeRepository>,
        gift_repo: Arc<dyn GiftRepository>,
        config: ShopConfig,
    ) -> Self {
        Self { prize_repo, gift_repo, config }
    }

    /// All configured slots with their gifts. A slot whose gift is gone fails
    /// the read instead of being dropped.
    pub async fn get_roulette_prizes(&self) -> Result<Vec<LootBoxPrizeWithGift>, Error> {
        let rows = self.prize_repo.list_prizes().await?;

        let mut errs = FieldErrors::new();
        let mut prizes = Vec::with_capacity(rows.len());
        for (prize, gift) in rows {
            match gift {
                Some(gift) => prizes.push(LootBoxPrizeWithGift { prize, gift }),
                None => {
                    warn!("Roulette slot {} references missing gift {}", prize.id, prize.gift_id);
                    errs.add(
                        format!("prizes[{}].gift_id", prize.id),
                        format!("gift {} no longer exists", prize.gift_id),
                    );
                }
            }
        }
        errs.into_result()?;
        Ok(prizes)
    }

    /// Admin view: every slot, active or not.
    pub async fn get_client_prizes(&self) -> Result<Vec<ClientPrize>, Error> {
        let prizes = self.get_roulette_prizes().await?;
        Ok(transform_prizes_to_client_format(&prizes))
    }

    /// Player view: active slots that can still be won.
    pub async fn get_playable_prizes(&self) -> Result<Vec<ClientPrize>, Error> {
        let prizes = self.get_roulette_prizes().await?;
        let playable: Vec<LootBoxPrizeWithGift> = prizes
            .into_iter()
            .filter(|p| p.prize.is_active && !p.prize.is_exhausted())
            .collect();
        Ok(transform_prizes_to_client_format(&playable))
    }

    /// Replaces the whole configuration. Nothing is written unless every entry
    /// passes validation and the store commits all of them together.
    pub async fn save_roulette_prizes(&self, entries: &[PrizeEntryInput]) -> Result<(), Error> {
        let mut errs = validate_entries(entries, self.config.max_total_drop_chance);

        let gifts = self.load_gifts(entries).await?;
        let existing: HashMap<Uuid, LootBoxPrize> = self
            .prize_repo
            .list_prizes()
            .await?
            .into_iter()
            .map(|(p, _)| (p.id, p))
            .collect();

        for (i, e) in entries.iter().enumerate() {
            if !gifts.contains_key(&e.gift_id) {
                errs.add(format!("entries[{i}].gift_id"), format!("gift {} does not exist", e.gift_id));
            }
            // Wins already recorded on a slot survive the re-save.
            let recorded = e.loot_box_prize_id.and_then(|id| existing.get(&id)).map(|p| p.current_wins);
            if let (Some(recorded), Some(max)) = (recorded, e.max_wins) {
                if recorded > max {
                    errs.add(
                        format!("entries[{i}].max_wins"),
                        format!("must not be below the {recorded} wins already recorded"),
                    );
                }
            }
        }
        errs.into_result()?;

        let now = Utc::now();
        let prizes: Vec<LootBoxPrize> = entries
            .iter()
            .map(|e| {
                let previous = e.loot_box_prize_id.and_then(|id| existing.get(&id));
                LootBoxPrize {
                    id: previous.map(|p| p.id).unwrap_or_else(Uuid::new_v4),
                    gift_id: e.gift_id,
                    drop_chance: e.drop_chance,
                    color: e.color.trim().to_string(),
                    max_wins: e.max_wins,
                    current_wins: previous.map(|p| p.current_wins).unwrap_or(e.current_wins),
                    is_active: e.is_active,
                    created_at: previous.map(|p| p.created_at).unwrap_or(now),
                    updated_at: now,
                }
            })
            .collect();

        self.prize_repo.replace_prizes(&prizes).await?;
        info!(
            "Saved roulette configuration: {} slot(s), active chance sum {}%",
            prizes.len(),
            active_chance_sum(entries)
        );
        Ok(())
    }

    /// Gift picker lookup for the roulette editor.
    pub async fn search_gifts(&self, query: &str) -> Result<Vec<Gift>, Error> {
        self.gift_repo.search_gifts(query, self.config.search_limit).await
    }

    async fn load_gifts(&self, entries: &[PrizeEntryInput]) -> Result<HashMap<Uuid, Gift>, Error> {
        let mut gifts = HashMap::new();
        for e in entries {
            if gifts.contains_key(&e.gift_id) {
                continue;
            }
            if let Some(g) = self.gift_repo.get_gift(e.gift_id).await? {
                gifts.insert(e.gift_id, g);
            }
        }
        Ok(gifts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftshop_common::models::BackdropVariant;

    fn entry(chance: f64, active: bool) -> PrizeEntryInput {
        PrizeEntryInput {
            loot_box_prize_id: None,
            gift_id: Uuid::new_v4(),
            drop_chance: chance,
            color: "#FFD700".into(),
            max_wins: None,
            current_wins: 0,
            is_active: active,
        }
    }

    fn slot(gift: &Gift, chance: f64, color: &str) -> LootBoxPrizeWithGift {
        let now = Utc::now();
        LootBoxPrizeWithGift {
            prize: LootBoxPrize {
                id: Uuid::new_v4(),
                gift_id: gift.id,
                drop_chance: chance,
                color: color.into(),
                max_wins: Some(5),
                current_wins: 2,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            gift: gift.clone(),
        }
    }

    fn gift() -> Gift {
        let now = Utc::now();
        Gift {
            id: Uuid::new_v4(),
            name: "Star".into(),
            description: Some("Shiny".into()),
            media_url: "https://cdn.example/star.webp".into(),
            price: 10,
            quantity: 100,
            sold: 0,
            is_special_offer: false,
            backdrop_variant: BackdropVariant::Yellow,
            tags: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds the input shape from client output, the way the editor round-trips it.
    fn remap(cp: &ClientPrize) -> LootBoxPrizeWithGift {
        let now = Utc::now();
        LootBoxPrizeWithGift {
            prize: LootBoxPrize {
                id: cp.loot_box_prize_id,
                gift_id: cp.id,
                drop_chance: cp.drop_chance,
                color: cp.color.clone(),
                max_wins: cp.max_wins,
                current_wins: cp.current_wins,
                is_active: cp.is_active,
                created_at: now,
                updated_at: now,
            },
            gift: Gift {
                id: cp.id,
                name: cp.name.clone(),
                description: None,
                media_url: cp.media_url.clone(),
                price: cp.price,
                quantity: 1,
                sold: 0,
                is_special_offer: false,
                backdrop_variant: BackdropVariant::Blue,
                tags: vec![],
                created_at: now,
                updated_at: now,
            },
        }
    }

    #[test]
    fn same_gift_in_two_slots_keeps_distinct_slot_ids() {
        let g = gift();
        let prizes = vec![slot(&g, 10.0, "red"), slot(&g, 5.0, "blue")];
        let out = transform_prizes_to_client_format(&prizes);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, g.id);
        assert_eq!(out[1].id, g.id);
        assert_ne!(out[0].loot_box_prize_id, out[1].loot_box_prize_id);
        assert_eq!(out[0].loot_box_prize_id, prizes[0].prize.id);
        assert_ne!(out[0].loot_box_prize_id, g.id);
        assert_eq!(out[1].color, "blue");
        assert_eq!(out[0].max_wins, Some(5));
        assert_eq!(out[0].current_wins, 2);
    }

    #[test]
    fn transform_is_idempotent() {
        let g = gift();
        let prizes = vec![slot(&g, 12.5, "red"), slot(&gift(), 0.0, "green")];
        let once = transform_prizes_to_client_format(&prizes);
        let remapped: Vec<_> = once.iter().map(remap).collect();
        let twice = transform_prizes_to_client_format(&remapped);
        assert_eq!(once, twice);
    }

    #[test]
    fn client_format_uses_camel_case() {
        let g = gift();
        let out = transform_prizes_to_client_format(&[slot(&g, 1.0, "red")]);
        let json = serde_json::to_value(&out[0]).unwrap();
        assert!(json.get("lootBoxPrizeId").is_some());
        assert!(json.get("dropChance").is_some());
        assert!(json.get("mediaUrl").is_some());
    }

    #[test]
    fn zero_and_partial_sums_are_fine() {
        assert!(validate_entries(&[], 100.0).is_empty());
        assert!(validate_entries(&[entry(0.0, true)], 100.0).is_empty());
        assert!(validate_entries(&[entry(30.0, true), entry(20.0, true)], 100.0).is_empty());
        assert!(validate_entries(&[entry(60.0, true), entry(40.0, true)], 100.0).is_empty());
    }

    #[test]
    fn over_ceiling_counts_only_active_slots() {
        let errs = validate_entries(&[entry(60.0, true), entry(50.0, true)], 100.0);
        assert!(errs.contains("entries"));

        let errs = validate_entries(&[entry(60.0, true), entry(50.0, false)], 100.0);
        assert!(errs.is_empty());
    }

    #[test]
    fn overflowing_sum_is_over_ceiling() {
        let errs = validate_entries(&[entry(1e308, true), entry(1e308, true)], 100.0);
        assert!(errs.contains("entries"));
        assert!(!errs.contains("entries[0].drop_chance"));
    }

    #[test]
    fn per_entry_problems_are_named() {
        let mut bad = entry(-1.0, true);
        bad.color = " ".into();
        bad.max_wins = Some(1);
        bad.current_wins = 2;
        let nan = entry(f64::NAN, true);
        let errs = validate_entries(&[bad, nan], 100.0);

        assert_eq!(errs.get("entries[0].drop_chance"), Some("must not be negative"));
        assert!(errs.contains("entries[0].color"));
        assert_eq!(errs.get("entries[0].current_wins"), Some("must not exceed max_wins"));
        assert_eq!(errs.get("entries[1].drop_chance"), Some("must be a number"));
    }

    #[test]
    fn duplicate_slot_ids_rejected() {
        let id = Uuid::new_v4();
        let mut a = entry(1.0, true);
        a.loot_box_prize_id = Some(id);
        let mut b = entry(1.0, true);
        b.loot_box_prize_id = Some(id);
        let errs = validate_entries(&[a, b], 100.0);
        assert!(errs.contains("entries[1].loot_box_prize_id"));
    }
}
