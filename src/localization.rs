use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use lazy_static::lazy_static;
use unic_langid::LanguageIdentifier;
use anyhow::{anyhow, Result};

const EN_RESOURCE: &str = include_str!("../locales/en/main.ftl");

lazy_static! {
    static ref LOCALIZATION_MANAGER: LocalizationManager = LocalizationManager::new().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load bundled messages");
        LocalizationManager::empty()
    });
}

/// Localization manager for the bridge's chat replies
pub struct LocalizationManager {
    bundle: FluentBundle<FluentResource>,
}

impl LocalizationManager {
    /// Create a manager with the bundled English messages
    pub fn new() -> Result<Self> {
        let mut bundle = Self::create_bundle()?;

        let resource = FluentResource::try_new(EN_RESOURCE.to_string())
            .map_err(|(_, errors)| anyhow!("invalid message resource: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("duplicate messages: {errors:?}"))?;

        Ok(Self { bundle })
    }

    fn empty() -> Self {
        Self {
            bundle: FluentBundle::new_concurrent(Vec::new()),
        }
    }

    fn create_bundle() -> Result<FluentBundle<FluentResource>> {
        let en_locale: LanguageIdentifier = "en".parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![en_locale]);
        // Replies must be verbatim, without bidi isolation marks around arguments
        bundle.set_use_isolating(false);
        Ok(bundle)
    }

    /// Get a message, formatting it with `args`
    pub fn get_message(&self, key: &str, args: &[(&str, &str)]) -> String {
        let msg = match self.bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {key}"),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {key}"),
        };

        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, FluentValue::from(*value));
        }

        let mut errors = vec![];
        let value = self
            .bundle
            .format_pattern(pattern, Some(&fluent_args), &mut errors);
        if !errors.is_empty() {
            tracing::warn!(key, errors = ?errors, "Message formatted with errors");
        }
        value.into_owned()
    }
}

/// Convenience function to get a message
pub fn t(key: &str) -> String {
    LOCALIZATION_MANAGER.get_message(key, &[])
}

/// Convenience function to get a message with arguments
pub fn t_args(key: &str, args: &[(&str, &str)]) -> String {
    LOCALIZATION_MANAGER.get_message(key, args)
}
