//! Device identity: a stable per-device id and a human-readable name.
//!
//! Both values live in preferences and are created once at startup by
//! [`DeviceIdentity::load_or_init`]. After that the identity is an immutable
//! value handed to whatever needs it.

use std::fmt;

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::prefs::{PreferenceStore, DEVICE_ID_KEY, DEVICE_NAME_KEY};

const DEVICE_ID_PREFIX: &str = "device_";
const DEVICE_TOKEN_LEN: usize = 9;
const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Host platform family used for the default device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    WindowsPc,
    Mac,
    Linux,
    Android,
    IPhone,
    IPad,
    Unknown,
}

impl Platform {
    /// Classify a user-agent string.
    ///
    /// Checks run in a fixed order (Windows, Mac, Linux, Android, iPhone,
    /// iPad), so an Android agent that also mentions Linux is reported as
    /// Linux.
    pub fn from_user_agent(user_agent: &str) -> Self {
        const ORDER: [(&str, Platform); 6] = [
            ("Windows", Platform::WindowsPc),
            ("Mac", Platform::Mac),
            ("Linux", Platform::Linux),
            ("Android", Platform::Android),
            ("iPhone", Platform::IPhone),
            ("iPad", Platform::IPad),
        ];

        ORDER
            .iter()
            .find(|(needle, _)| user_agent.contains(needle))
            .map_or(Self::Unknown, |(_, platform)| *platform)
    }

    /// Platform of the running host.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Self::WindowsPc,
            "macos" => Self::Mac,
            "linux" | "freebsd" | "openbsd" | "netbsd" => Self::Linux,
            "android" => Self::Android,
            "ios" => Self::IPhone,
            _ => Self::Unknown,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::WindowsPc => "Windows PC",
            Self::Mac => "Mac",
            Self::Linux => "Linux",
            Self::Android => "Android",
            Self::IPhone => "iPhone",
            Self::IPad => "iPad",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity of this device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub id: String,
    pub name: String,
}

impl DeviceIdentity {
    /// Read the identity from preferences, generating and persisting any
    /// missing part.
    pub fn load_or_init(prefs: &dyn PreferenceStore, platform: Platform) -> Result<Self> {
        let id = if let Some(id) = prefs.get(DEVICE_ID_KEY) {
            id
        } else {
            let id = generate_device_id(Utc::now().timestamp_millis());
            prefs.set(DEVICE_ID_KEY, &id)?;
            tracing::info!("Generated new device id {id}");
            id
        };

        let name = if let Some(name) = prefs.get(DEVICE_NAME_KEY) {
            name
        } else {
            let name = default_device_name(platform, Local::now().date_naive());
            prefs.set(DEVICE_NAME_KEY, &name)?;
            name
        };

        Ok(Self { id, name })
    }

    /// First eight characters of the id, used in export file names.
    pub fn short_id(&self) -> String {
        self.id.chars().take(8).collect()
    }
}

/// Overwrite the stored device name. Always reports success; a failed write
/// is only logged.
pub fn set_device_name(prefs: &dyn PreferenceStore, name: &str) -> bool {
    if let Err(error) = prefs.set(DEVICE_NAME_KEY, name.trim()) {
        tracing::warn!("Failed to persist device name: {}", error);
    }
    true
}

/// `device_<9 base-36 chars>_<unix ms>`
pub fn generate_device_id(now_ms: i64) -> String {
    format!("{DEVICE_ID_PREFIX}{}_{now_ms}", random_base36_token(DEVICE_TOKEN_LEN))
}

/// Default device name, e.g. `Linux (3/14/2024)`.
pub fn default_device_name(platform: Platform, created_on: NaiveDate) -> String {
    format!("{platform} ({})", created_on.format("%-m/%-d/%Y"))
}

fn random_base36_token(len: usize) -> String {
    let mut entropy = Uuid::new_v4().as_u128();
    (0..len)
        .map(|_| {
            let digit = usize::try_from(entropy % 36).unwrap_or_default();
            entropy /= 36;
            char::from(BASE36_DIGITS[digit])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPreferences;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_user_agents_in_order() {
        assert_eq!(
            Platform::from_user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"),
            Platform::WindowsPc
        );
        assert_eq!(
            Platform::from_user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0)"),
            Platform::Mac
        );
        assert_eq!(
            Platform::from_user_agent("Mozilla/5.0 (Linux; Android 14; Pixel 8)"),
            Platform::Linux
        );
        assert_eq!(
            Platform::from_user_agent("Dalvik/2.1.0 (Android 14)"),
            Platform::Android
        );
        assert_eq!(Platform::from_user_agent("curl/8.0"), Platform::Unknown);
    }

    #[test]
    fn iphone_agent_mentioning_mac_is_mac() {
        assert_eq!(
            Platform::from_user_agent("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"),
            Platform::Mac
        );
    }

    #[test]
    fn device_id_has_prefix_token_and_timestamp() {
        let id = generate_device_id(1_700_000_000_000);
        let rest = id.strip_prefix(DEVICE_ID_PREFIX).unwrap();
        let (token, timestamp) = rest.split_once('_').unwrap();

        assert_eq!(token.len(), DEVICE_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(timestamp, "1700000000000");
    }

    #[test]
    fn default_name_uses_platform_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(default_device_name(Platform::WindowsPc, date), "Windows PC (3/4/2024)");
    }

    #[test]
    fn identity_is_stable_while_preferences_persist() {
        let prefs = MemoryPreferences::new();

        let first = DeviceIdentity::load_or_init(&prefs, Platform::Linux).unwrap();
        let second = DeviceIdentity::load_or_init(&prefs, Platform::Linux).unwrap();

        assert_eq!(first, second);
        assert!(first.name.starts_with("Linux ("));
    }

    #[test]
    fn clearing_preferences_generates_new_id() {
        let prefs = MemoryPreferences::new();

        let first = DeviceIdentity::load_or_init(&prefs, Platform::Mac).unwrap();
        prefs.clear();
        let second = DeviceIdentity::load_or_init(&prefs, Platform::Mac).unwrap();

        assert_ne!(first.id, second.id);
    }

    #[test]
    fn set_device_name_trims_and_overwrites() {
        let prefs = MemoryPreferences::new();
        DeviceIdentity::load_or_init(&prefs, Platform::Linux).unwrap();

        assert!(set_device_name(&prefs, "  Line 3 tablet  "));

        let identity = DeviceIdentity::load_or_init(&prefs, Platform::Linux).unwrap();
        assert_eq!(identity.name, "Line 3 tablet");
    }

    #[test]
    fn short_id_takes_eight_chars() {
        let identity = DeviceIdentity {
            id: "device_abcdefghi_1".to_string(),
            name: String::new(),
        };
        assert_eq!(identity.short_id(), "device_a");
    }
}
