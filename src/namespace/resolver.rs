//! Namespace name → (base name, content type).

use crate::namespace::{ConfigType, NamespaceError, NamespaceResult};

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNamespace {
    /// Name the server knows the namespace by.
    pub base_name: String,
    pub config_type: ConfigType,
}

/// Resolve a raw namespace identifier.
///
/// A `.properties` suffix is stripped because the server addresses
/// properties namespaces by their bare name. Every other recognized
/// suffix is part of the server-side name and is kept. Names without a
/// recognized suffix are properties namespaces.
pub fn resolve(raw: &str) -> NamespaceResult<ResolvedNamespace> {
    let matched = ConfigType::ALL.into_iter().find(|ty| {
        raw.strip_suffix(ty.suffix())
            .is_some_and(|rest| rest.ends_with('.'))
    });

    let resolved = match matched {
        Some(ConfigType::DEFAULT) => ResolvedNamespace {
            base_name: raw[..raw.len() - ConfigType::DEFAULT.suffix().len() - 1].to_string(),
            config_type: ConfigType::DEFAULT,
        },
        Some(config_type) => ResolvedNamespace {
            base_name: raw.to_string(),
            config_type,
        },
        None => ResolvedNamespace {
            base_name: raw.to_string(),
            config_type: ConfigType::DEFAULT,
        },
    };

    if resolved.base_name.is_empty() {
        return Err(NamespaceError::InvalidArgument(raw.to_string()));
    }

    Ok(resolved)
}
