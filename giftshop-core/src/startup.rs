// giftshop-core/src/startup.rs

use once_cell::sync::OnceCell;

use crate::Error;

/// One-shot initialization guard owned by the binary's startup sequence.
///
/// The first `run` executes its closure and stores the result; any later call
/// is an error rather than a silent no-op.
pub struct StartupGuard<T> {
    name: &'static str,
    cell: OnceCell<T>,
}

impl<T> StartupGuard<T> {
    pub const fn new(name: &'static str) -> Self {
        Self { name, cell: OnceCell::new() }
    }

    pub fn run<F>(&self, init: F) -> Result<&T, Error>
    where
        F: FnOnce() -> Result<T, Error>,
    {
        if self.cell.get().is_some() {
            return Err(Error::Config(format!("{} already initialized", self.name)));
        }
        let value = init()?;
        self.cell
            .set(value)
            .map_err(|_| Error::Config(format!("{} already initialized", self.name)))?;
        self.get()
    }

    pub fn get(&self) -> Result<&T, Error> {
        self.cell
            .get()
            .ok_or_else(|| Error::Config(format!("{} not initialized", self.name)))
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_run_is_rejected() {
        let guard: StartupGuard<u8> = StartupGuard::new("tracing");
        assert!(guard.get().is_err());
        assert_eq!(*guard.run(|| Ok(7)).unwrap(), 7);
        assert!(guard.is_initialized());

        let again = guard.run(|| Ok(9));
        assert!(matches!(again, Err(Error::Config(_))));
        assert_eq!(*guard.get().unwrap(), 7);
    }

    #[test]
    fn failed_init_leaves_guard_open() {
        let guard: StartupGuard<u8> = StartupGuard::new("config");
        assert!(guard.run(|| Err(Error::Config("bad".into()))).is_err());
        assert!(!guard.is_initialized());
        assert!(guard.run(|| Ok(1)).is_ok());
    }
}
