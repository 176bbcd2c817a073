use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 邏輯欄位順序；payload 依此順序組裝，與表格欄位一致
pub const LOGICAL_FIELDS: [&str; 12] = [
    "fecha",
    "servicio",
    "lider",
    "representante",
    "producto",
    "dni",
    "gestion",
    "caso_yoizen",
    "flow_sin_deco",
    "unificacion",
    "provincia",
    "promo_tactica",
];

/// Form endpoint URL plus the logical-field → backend-entry-key mapping.
/// Treated as immutable during a submission pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormConfig {
    pub form_url: String,
    pub entries: HashMap<String, String>,
}

impl FormConfig {
    fn from_pairs(form_url: &str, pairs: [(&str, &str); 12]) -> Self {
        Self {
            form_url: form_url.to_string(),
            entries: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// 測試表單（已驗證可收件的那份）
    pub fn test_preset() -> Self {
        Self::from_pairs(
            "https://docs.google.com/forms/d/e/1FAIpQLSfMOZTUzWMdfyeYhSeE5F4AuoQV6hs8luslEzCGnfFyCh6jcA/formResponse",
            [
                ("fecha", "entry.101913523"),
                ("servicio", "entry.1544604602"),
                ("lider", "entry.48171834"),
                ("representante", "entry.614923459"),
                ("producto", "entry.267393900"),
                ("dni", "entry.1223153849"),
                ("gestion", "entry.2044585376"),
                ("caso_yoizen", "entry.1258293142"),
                ("flow_sin_deco", "entry.1541832960"),
                ("unificacion", "entry.423471570"),
                ("provincia", "entry.49049516"),
                ("promo_tactica", "entry.862315059"),
            ],
        )
    }

    /// 正式表單
    pub fn default_preset() -> Self {
        Self::from_pairs(
            "https://docs.google.com/forms/d/e/1FAIpQLSeytdXFZj8LWi72s4rQU4OE_QqTNV3sNmRkJyJjZU3YBFd3xQ/formResponse",
            [
                ("fecha", "entry.1781500597"),
                ("servicio", "entry.2103711837"),
                ("lider", "entry.1640447617"),
                ("representante", "entry.297979220"),
                ("producto", "entry.1078004677"),
                ("dni", "entry.2091996480"),
                ("gestion", "entry.1531477507"),
                ("caso_yoizen", "entry.624182876"),
                ("flow_sin_deco", "entry.1368250571"),
                ("unificacion", "entry.538026869"),
                ("provincia", "entry.2040870261"),
                ("promo_tactica", "entry.85694086"),
            ],
        )
    }
}

impl Validate for FormConfig {
    fn validate(&self) -> Result<()> {
        validate_url("form_url", &self.form_url)?;

        // 少了哪個邏輯欄位，送單時就會缺一欄；在啟動時擋下
        for field in LOGICAL_FIELDS {
            match self.entries.get(field) {
                Some(key) => validate_non_empty_string(&format!("entries.{}", field), key)?,
                None => {
                    return Err(crate::utils::error::FillerError::MissingConfigError {
                        field: format!("entries.{}", field),
                    })
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(FormConfig::test_preset().validate().is_ok());
        assert!(FormConfig::default_preset().validate().is_ok());
    }

    #[test]
    fn test_presets_differ() {
        assert_ne!(FormConfig::test_preset(), FormConfig::default_preset());
    }

    #[test]
    fn test_missing_entry_rejected() {
        let mut config = FormConfig::test_preset();
        config.entries.remove("producto");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_entry_key_rejected() {
        let mut config = FormConfig::test_preset();
        config.entries.insert("dni".to_string(), "  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_url_rejected() {
        let mut config = FormConfig::test_preset();
        config.form_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }
}
