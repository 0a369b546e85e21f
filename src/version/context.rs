//! Explicit "current version" context.
//!
//! Callers that need a default version pass a [`VersionContext`] instead of
//! relying on process-wide state.

use super::ItemVersion;

/// The version a request is operating in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionContext {
    current: ItemVersion,
}

impl VersionContext {
    pub fn new(current: ItemVersion) -> Self {
        Self { current }
    }

    #[inline]
    pub fn current(&self) -> &ItemVersion {
        &self.current
    }

    /// Substitute the current version when none was supplied.
    pub fn resolve(&self, version: Option<ItemVersion>) -> ItemVersion {
        version.unwrap_or_else(|| self.current.clone())
    }

    /// Context for a nested operation with some coordinates overridden.
    pub fn overlay(&self, overlay: &ItemVersion) -> Self {
        Self {
            current: self.current.superimpose(overlay),
        }
    }

    /// The part of the current version that a content type versions on.
    pub fn applicable(&self, coordinates: &ItemVersion) -> ItemVersion {
        self.current.mask(coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_to_current() {
        let ctx = VersionContext::new("locale=en;stage=live".parse().unwrap());
        assert_eq!(ctx.resolve(None), *ctx.current());

        let explicit: ItemVersion = "stage=draft".parse().unwrap();
        assert_eq!(ctx.resolve(Some(explicit.clone())), explicit);
    }

    #[test]
    fn test_overlay() {
        let ctx = VersionContext::new("locale=en;stage=live".parse().unwrap());
        let draft = ctx.overlay(&"stage=draft".parse().unwrap());
        assert_eq!(draft.current().to_string(), "locale=en;stage=draft");
        // original untouched
        assert_eq!(ctx.current().to_string(), "locale=en;stage=live");
    }

    #[test]
    fn test_applicable() {
        let ctx = VersionContext::new("locale=en;stage=live".parse().unwrap());
        let applicable = ctx.applicable(&"stage=any".parse().unwrap());
        assert_eq!(applicable.to_string(), "stage=live");
    }
}
