// ───────────────────────────── Alert kinds ───────────────────────────────

/// Structured civil-alert shapes recognised by the summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    FlashAlert, // "מבזק" pre-alert
    AreaAlert,  // "alerts expected in your area" instruction + regions
    EventEnded,
    ShelterExit,
    RedAlert, // "צבע אדום"
    RocketFire,
}

impl AlertKind {
    /// Summary header line.  `AreaAlert` has none: its instruction line
    /// doubles as the header.
    pub fn header(&self) -> Option<&'static str> {
        match self {
            Self::FlashAlert => Some("🚨 מבזק (Flash Alert)"),
            Self::AreaAlert => None,
            Self::EventEnded => Some("🚨 עדכון סיום אירוע (Event Ended Update)"),
            Self::ShelterExit => Some("🚨 עדכון יציאה מהמרחב המוגן (Shelter Exit Update)"),
            Self::RedAlert => Some("🚨 צבע אדום (Red Alert)"),
            Self::RocketFire => Some("🚨 ירי רקטות וטילים (Rocket/Missile Fire)"),
        }
    }

    /// Stable English name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FlashAlert => "FlashAlert",
            Self::AreaAlert => "AreaAlert",
            Self::EventEnded => "EventEnded",
            Self::ShelterExit => "ShelterExit",
            Self::RedAlert => "RedAlert",
            Self::RocketFire => "RocketFire",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
