use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(UrgencyTier {
    SelfCare => "self_care",
    Monitor => "monitor",
    Urgent => "urgent",
    Emergency => "emergency",
});

str_enum!(RiskPolicyKind {
    Additive => "additive",
    Weighted => "weighted",
});

str_enum!(ImageQuality {
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl UrgencyTier {
    /// All tiers in escalating order.
    pub const ALL: [UrgencyTier; 4] = [
        UrgencyTier::SelfCare,
        UrgencyTier::Monitor,
        UrgencyTier::Urgent,
        UrgencyTier::Emergency,
    ];

    /// Position on the severity scale; 0 is least severe.
    pub fn rank(&self) -> u8 {
        match self {
            Self::SelfCare => 0,
            Self::Monitor => 1,
            Self::Urgent => 2,
            Self::Emergency => 3,
        }
    }

    /// Fixed display color for the tier.
    pub fn color(&self) -> &'static str {
        match self {
            Self::SelfCare => "GREEN",
            Self::Monitor => "YELLOW",
            Self::Urgent => "ORANGE",
            Self::Emergency => "RED",
        }
    }

    /// Tier name as shown to the user. The two lowest tiers are named
    /// differently by each scoring policy.
    pub fn label(&self, policy: RiskPolicyKind) -> &'static str {
        match (self, policy) {
            (Self::SelfCare, RiskPolicyKind::Additive) => "Routine",
            (Self::SelfCare, RiskPolicyKind::Weighted) => "Self Care",
            (Self::Monitor, RiskPolicyKind::Additive) => "Monitor",
            (Self::Monitor, RiskPolicyKind::Weighted) => "Routine",
            (Self::Urgent, _) => "Urgent",
            (Self::Emergency, _) => "Emergency",
        }
    }
}

impl PartialOrd for UrgencyTier {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UrgencyTier {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl ImageQuality {
    /// Advisory resolution label. Never blocks analysis.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width < 300 || height < 300 {
            Self::Low
        } else if width < 800 {
            Self::Medium
        } else {
            Self::High
        }
    }
}
