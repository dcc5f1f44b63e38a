use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
/// Enumerates supported `SwitchLocale` values.
pub enum SwitchLocale {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "zh-CN", alias = "zh")]
    ZhCn,
}

impl SwitchLocale {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::ZhCn => "zh-CN",
        }
    }
}

impl FromStr for SwitchLocale {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" => Ok(Self::En),
            "zh" | "zh-cn" => Ok(Self::ZhCn),
            other => bail!("unsupported locale '{other}' (supported: en, zh-CN)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Every reply the `switch` command can produce, before localization.
pub enum SwitchMessage {
    NoneToggled,
    Listing {
        enabled: Option<Vec<String>>,
        disabled: Option<Vec<String>>,
        reset_hint: bool,
    },
    ResetAllDone,
    Conflict,
    Forbidden(Vec<String>),
    Unchanged,
    Applied {
        enabled: Vec<String>,
        disabled: Vec<String>,
    },
    ChannelNotFound,
    LowAuthority,
    Usage(String),
}

impl SwitchMessage {
    /// Stable identifier for logs and machine-readable output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoneToggled => "none",
            Self::Listing { .. } => "list",
            Self::ResetAllDone => "reset",
            Self::Conflict => "conflict",
            Self::Forbidden(_) => "forbidden",
            Self::Unchanged => "unchanged",
            Self::Applied { .. } => "applied",
            Self::ChannelNotFound => "channel_not_found",
            Self::LowAuthority => "low_authority",
            Self::Usage(_) => "usage",
        }
    }

    pub fn render(&self, locale: SwitchLocale) -> String {
        match locale {
            SwitchLocale::En => render_en(self),
            SwitchLocale::ZhCn => render_zh_cn(self),
        }
    }
}

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

fn render_en(message: &SwitchMessage) -> String {
    match message {
        SwitchMessage::NoneToggled => {
            "No commands are enabled or disabled in this channel.".to_string()
        }
        SwitchMessage::Listing {
            enabled,
            disabled,
            reset_hint,
        } => {
            let mut lines = Vec::new();
            if let Some(enabled) = enabled {
                lines.push(format!("Enabled commands: {}", join_names(enabled)));
            }
            if let Some(disabled) = disabled {
                lines.push(format!("Disabled commands: {}", join_names(disabled)));
            }
            if *reset_hint {
                lines.push("To reset every command, use the -R flag.".to_string());
            }
            lines.join("\n")
        }
        SwitchMessage::ResetAllDone => "All commands have been reset.".to_string(),
        SwitchMessage::Conflict => "Conflicting options.".to_string(),
        SwitchMessage::Forbidden(names) => {
            format!("You are not allowed to modify {}.", join_names(names))
        }
        SwitchMessage::Unchanged => "Nothing changed.".to_string(),
        SwitchMessage::Applied { enabled, disabled } => {
            let mut parts = Vec::new();
            if !enabled.is_empty() {
                parts.push(format!("enabled {}", join_names(enabled)));
            }
            if !disabled.is_empty() {
                parts.push(format!("disabled {}", join_names(disabled)));
            }
            let sentence = parts.join(" and ");
            let mut chars = sentence.chars();
            match chars.next() {
                Some(first) => format!("{}{}.", first.to_ascii_uppercase(), chars.as_str()),
                None => "Nothing changed.".to_string(),
            }
        }
        SwitchMessage::ChannelNotFound => "The specified channel was not found.".to_string(),
        SwitchMessage::LowAuthority => "Insufficient authority.".to_string(),
        SwitchMessage::Usage(text) => text.clone(),
    }
}

fn render_zh_cn(message: &SwitchMessage) -> String {
    match message {
        SwitchMessage::NoneToggled => "当前没有启用或禁用功能。".to_string(),
        SwitchMessage::Listing {
            enabled,
            disabled,
            reset_hint,
        } => {
            let mut lines = Vec::new();
            if let Some(enabled) = enabled {
                lines.push(format!("当前启用的功能有：{}", join_names(enabled)));
            }
            if let Some(disabled) = disabled {
                lines.push(format!("当前禁用的功能有：{}", join_names(disabled)));
            }
            if *reset_hint {
                lines.push("要重置所有功能, 使用-R参数。".to_string());
            }
            lines.join("\n")
        }
        SwitchMessage::ResetAllDone => "已重置所有功能。".to_string(),
        SwitchMessage::Conflict => "选项冲突。".to_string(),
        SwitchMessage::Forbidden(names) => format!("您无权修改 {} 功能。", join_names(names)),
        SwitchMessage::Unchanged => "无任何更改。".to_string(),
        SwitchMessage::Applied { enabled, disabled } => {
            let mut parts = Vec::new();
            if !enabled.is_empty() {
                parts.push(format!("启用 {} 功能", join_names(enabled)));
            }
            if !disabled.is_empty() {
                parts.push(format!("禁用 {} 功能", join_names(disabled)));
            }
            format!("已{}。", parts.join(", "))
        }
        SwitchMessage::ChannelNotFound => "未找到指定的频道。".to_string(),
        SwitchMessage::LowAuthority => "权限不足。".to_string(),
        SwitchMessage::Usage(text) => text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{SwitchLocale, SwitchMessage};

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn unit_locale_parses_case_insensitively() {
        assert_eq!("zh-CN".parse::<SwitchLocale>().expect("zh"), SwitchLocale::ZhCn);
        assert_eq!("EN".parse::<SwitchLocale>().expect("en"), SwitchLocale::En);
        assert!("fr".parse::<SwitchLocale>().is_err());
        let decoded: SwitchLocale = serde_json::from_str("\"zh\"").expect("alias");
        assert_eq!(decoded, SwitchLocale::ZhCn);
    }

    #[test]
    fn functional_zh_cn_applied_summary_lists_enabled_before_disabled() {
        let message = SwitchMessage::Applied {
            enabled: names(&["baz"]),
            disabled: names(&["dis"]),
        };
        assert_eq!(
            message.render(SwitchLocale::ZhCn),
            "已启用 baz 功能, 禁用 dis 功能。"
        );
    }

    #[test]
    fn functional_en_applied_summary_uses_conjunction() {
        let message = SwitchMessage::Applied {
            enabled: names(&["baz", "qux"]),
            disabled: names(&["dis"]),
        };
        assert_eq!(
            message.render(SwitchLocale::En),
            "Enabled baz, qux and disabled dis."
        );
        let disabled_only = SwitchMessage::Applied {
            enabled: Vec::new(),
            disabled: names(&["baz"]),
        };
        assert_eq!(disabled_only.render(SwitchLocale::En), "Disabled baz.");
    }

    #[test]
    fn functional_listing_appends_reset_hint_last() {
        let message = SwitchMessage::Listing {
            enabled: Some(names(&["dis"])),
            disabled: Some(names(&["bar"])),
            reset_hint: true,
        };
        assert_eq!(
            message.render(SwitchLocale::ZhCn),
            "当前启用的功能有：dis\n当前禁用的功能有：bar\n要重置所有功能, 使用-R参数。"
        );
    }
}
