use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use giftshop_common::models::{BackdropVariant, Gift, GiftInput};
use giftshop_common::{Error, FieldErrors};

use super::{fits_i32, optional_text, required_enum, required_int, required_text, DisplayEnum, FormNumber};

/// Gift create/edit form as the admin UI submits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GiftForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub price: Option<FormNumber>,
    #[serde(default)]
    pub quantity: Option<FormNumber>,
    #[serde(default)]
    pub is_special_offer: Option<bool>,
    /// `yellow` or `blue`.
    #[serde(default)]
    pub backdrop_variant: Option<String>,
    /// Comma-separated.
    #[serde(default)]
    pub tags: Option<String>,
}

impl GiftForm {
    /// Converts to storage dialect, reporting every offending field at once.
    pub fn normalize(&self) -> Result<GiftInput, Error> {
        let mut errs = FieldErrors::new();

        let name = required_text(&mut errs, "name", &self.name);
        let media_url = required_text(&mut errs, "media_url", &self.media_url);
        let price = required_int(&mut errs, "price", &self.price, 1);
        let quantity = required_int(&mut errs, "quantity", &self.quantity, 1)
            .and_then(|q| fits_i32(&mut errs, "quantity", q));
        let backdrop_variant =
            required_enum::<BackdropVariant>(&mut errs, "backdrop_variant", &self.backdrop_variant);

        if let Some(url) = media_url.as_deref() {
            if url::Url::parse(url).is_err() && !url.starts_with('/') {
                errs.add("media_url", "must be an absolute URL or a path");
            }
        }

        match (name, media_url, price, quantity, backdrop_variant) {
            (Some(name), Some(media_url), Some(price), Some(quantity), Some(backdrop_variant))
                if errs.is_empty() =>
            {
                Ok(GiftInput {
                    name,
                    description: optional_text(&self.description),
                    media_url,
                    price,
                    quantity,
                    is_special_offer: self.is_special_offer.unwrap_or(false),
                    backdrop_variant,
                    tags: split_tags(self.tags.as_deref()),
                })
            }
            _ => Err(Error::Validation(errs)),
        }
    }
}

impl From<&Gift> for GiftForm {
    fn from(g: &Gift) -> Self {
        Self {
            name: Some(g.name.clone()),
            description: g.description.clone(),
            media_url: Some(g.media_url.clone()),
            price: Some(FormNumber::from(g.price)),
            quantity: Some(FormNumber::from(g.quantity)),
            is_special_offer: Some(g.is_special_offer),
            backdrop_variant: Some(g.backdrop_variant.display_name()),
            tags: Some(g.tags.join(", ")),
        }
    }
}

/// Splits, trims, lowercases and de-duplicates a comma-separated tag list.
pub fn split_tags(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn valid_form() -> GiftForm {
        GiftForm {
            name: Some("  Teddy Bear ".into()),
            description: Some("".into()),
            media_url: Some("https://cdn.example/teddy.webp".into()),
            price: Some(FormNumber::Text("150".into())),
            quantity: Some(FormNumber::Int(10)),
            is_special_offer: None,
            backdrop_variant: Some("blue".into()),
            tags: Some("Plush, cute,plush, ".into()),
        }
    }

    #[test]
    fn normalizes_to_storage_dialect() {
        let input = valid_form().normalize().unwrap();
        assert_eq!(input.name, "Teddy Bear");
        assert_eq!(input.description, None);
        assert_eq!(input.price, 150);
        assert_eq!(input.quantity, 10);
        assert_eq!(input.backdrop_variant, BackdropVariant::Blue);
        assert_eq!(input.tags, vec!["cute".to_string(), "plush".to_string()]);
        assert!(!input.is_special_offer);

        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["backdropVariant"], "BLUE");
        assert_eq!(json["mediaUrl"], "https://cdn.example/teddy.webp");
        assert_eq!(json["isSpecialOffer"], false);
    }

    #[test]
    fn unknown_backdrop_is_rejected() {
        for bad in ["green", "", "yelow"] {
            let form = GiftForm { backdrop_variant: Some(bad.into()), ..valid_form() };
            match form.normalize() {
                Err(Error::Validation(errs)) => assert!(errs.contains("backdrop_variant"), "{bad}"),
                other => panic!("expected validation error for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn every_offending_field_is_reported() {
        let form = GiftForm {
            name: None,
            price: Some(FormNumber::Int(0)),
            quantity: Some(FormNumber::Text("lots".into())),
            media_url: Some("not a url".into()),
            ..valid_form()
        };
        let Err(Error::Validation(errs)) = form.normalize() else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errs.fields().collect();
        assert_eq!(fields, vec!["media_url", "name", "price", "quantity"]);
    }

    #[test]
    fn gift_prefills_back_into_the_form() {
        let now = Utc::now();
        let gift = Gift {
            id: Uuid::new_v4(),
            name: "Rocket".into(),
            description: Some("Goes up".into()),
            media_url: "https://cdn.example/rocket.webp".into(),
            price: 300,
            quantity: 5,
            sold: 2,
            is_special_offer: true,
            backdrop_variant: BackdropVariant::Yellow,
            tags: vec!["space".into(), "toy".into()],
            created_at: now,
            updated_at: now,
        };
        let form = GiftForm::from(&gift);
        assert_eq!(form.backdrop_variant.as_deref(), Some("yellow"));
        assert_eq!(form.tags.as_deref(), Some("space, toy"));

        let input = form.normalize().unwrap();
        assert_eq!(input.name, gift.name);
        assert_eq!(input.price, gift.price);
        assert_eq!(input.tags, gift.tags);
        assert_eq!(input.backdrop_variant, gift.backdrop_variant);
    }
}
