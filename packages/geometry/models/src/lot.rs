//! Lot-shape labels, cadastral subtype codes, and the thresholds used to
//! derive them.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Human-meaningful lot-shape classification.
///
/// Serializes as its display string. Strings that are not one of the fixed
/// labels round-trip through [`LotLabel::Subtype`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LotLabel {
    /// Narrow street frontage opening onto a wider body (battle-axe).
    RestrictedAccess,
    /// Noticeably wider at the front than at the rear.
    FrontWiderTapered,
    /// Noticeably wider at the rear than at the front.
    RearWiderTapered,
    /// Side lengths differ markedly.
    Irregular,
    /// Flagged as a corner lot by its cadastral subtype.
    Corner,
    /// An upstream subtype code with no fixed label of its own.
    Subtype(String),
    /// No heuristic applied.
    Unclassified,
}

impl LotLabel {
    /// Display string for this label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::RestrictedAccess => "restricted-access lot",
            Self::FrontWiderTapered => "front-wider tapered lot",
            Self::RearWiderTapered => "rear-wider tapered lot",
            Self::Irregular => "irregular lot",
            Self::Corner => "corner lot",
            Self::Subtype(code) => code,
            Self::Unclassified => "unclassified",
        }
    }
}

impl std::fmt::Display for LotLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for LotLabel {
    fn from(value: String) -> Self {
        match value.as_str() {
            "restricted-access lot" => Self::RestrictedAccess,
            "front-wider tapered lot" => Self::FrontWiderTapered,
            "rear-wider tapered lot" => Self::RearWiderTapered,
            "irregular lot" => Self::Irregular,
            "corner lot" => Self::Corner,
            "unclassified" => Self::Unclassified,
            _ => Self::Subtype(value),
        }
    }
}

impl From<LotLabel> for String {
    fn from(label: LotLabel) -> Self {
        match label {
            LotLabel::Subtype(code) => code,
            other => other.as_str().to_string(),
        }
    }
}

/// Cadastral lot subtype as reported by an upstream source.
///
/// Serializes as a plain code string; deserialization goes through
/// [`LotSubtype::from_code`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LotSubtype {
    /// Ordinary lot; carries no label of its own.
    Standard,
    /// Battle-axe / hatchet lot reached via an access handle.
    BattleAxe,
    /// Lot with two street frontages.
    Corner,
    /// Explicitly irregular lot.
    Irregular,
    /// Any other code, kept verbatim.
    Other(String),
}

impl LotSubtype {
    /// Maps a free-form code to a subtype.
    ///
    /// Matching ignores case, surrounding whitespace, and `-`/`_`/space
    /// separators. Empty codes are [`Self::Standard`].
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let key: String = code
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "" | "standard" | "regular" | "normal" | "lot" => Self::Standard,
            "battleaxe" | "hatchet" | "handle" | "accessway" => Self::BattleAxe,
            "corner" => Self::Corner,
            "irregular" => Self::Irregular,
            _ => Self::Other(code.trim().to_string()),
        }
    }

    /// Canonical code; [`Self::from_code`] maps it back to the same variant.
    #[must_use]
    pub fn as_code(&self) -> &str {
        match self {
            Self::Standard => "standard",
            Self::BattleAxe => "battle_axe",
            Self::Corner => "corner",
            Self::Irregular => "irregular",
            Self::Other(code) => code,
        }
    }

    /// Label implied by the subtype alone, if any.
    #[must_use]
    pub fn fixed_label(&self) -> Option<LotLabel> {
        match self {
            Self::BattleAxe => Some(LotLabel::RestrictedAccess),
            Self::Corner => Some(LotLabel::Corner),
            Self::Irregular => Some(LotLabel::Irregular),
            Self::Standard | Self::Other(_) => None,
        }
    }
}

impl From<String> for LotSubtype {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<LotSubtype> for String {
    fn from(subtype: LotSubtype) -> Self {
        match subtype {
            LotSubtype::Other(code) => code,
            known => known.as_code().to_string(),
        }
    }
}

/// Compactness band for a polygon's regularity index.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegularityClass {
    /// Close to rectangular.
    #[strum(serialize = "regular lot")]
    Regular,
    /// Somewhat elongated or jogged.
    #[strum(serialize = "mildly irregular")]
    MildlyIrregular,
    /// Far from compact.
    #[strum(serialize = "irregular lot")]
    Irregular,
}

/// Thresholds for lot-shape heuristics and regularity banding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotRules {
    /// Front must be below `rear × ratio` to count as restricted access.
    pub restricted_front_ratio: f64,
    /// Front must also be narrower than this, in metres.
    pub restricted_front_max_m: f64,
    /// `front / rear` above this is front-wider tapered.
    pub front_wider_ratio: f64,
    /// `front / rear` below this is rear-wider tapered.
    pub rear_wider_ratio: f64,
    /// `max(left, right) / min(left, right)` above this is irregular.
    pub irregular_side_ratio: f64,
    /// Regularity index at or above which a lot is [`RegularityClass::Regular`].
    pub regular_min: f64,
    /// Regularity index at or above which a lot is
    /// [`RegularityClass::MildlyIrregular`].
    pub mildly_irregular_min: f64,
}

impl Default for LotRules {
    fn default() -> Self {
        Self {
            restricted_front_ratio: 0.5,
            restricted_front_max_m: 6.0,
            front_wider_ratio: 1.4,
            rear_wider_ratio: 0.7,
            irregular_side_ratio: 1.5,
            regular_min: 0.9,
            mildly_irregular_min: 0.7,
        }
    }
}

impl LotRules {
    /// Bands a regularity index.
    #[must_use]
    pub fn regularity_class(&self, regularity: f64) -> RegularityClass {
        if regularity >= self.regular_min {
            RegularityClass::Regular
        } else if regularity >= self.mildly_irregular_min {
            RegularityClass::MildlyIrregular
        } else {
            RegularityClass::Irregular
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtype_codes_are_normalized() {
        assert_eq!(LotSubtype::from_code("Battle-Axe"), LotSubtype::BattleAxe);
        assert_eq!(LotSubtype::from_code(" battle_axe "), LotSubtype::BattleAxe);
        assert_eq!(LotSubtype::from_code("CORNER"), LotSubtype::Corner);
        assert_eq!(LotSubtype::from_code(""), LotSubtype::Standard);
        assert_eq!(
            LotSubtype::from_code(" Strata "),
            LotSubtype::Other("Strata".to_string())
        );
    }

    #[test]
    fn subtypes_deserialize_from_raw_codes() {
        let subtype: LotSubtype = serde_json::from_str(r#""Battle-Axe""#).unwrap();
        assert_eq!(subtype, LotSubtype::BattleAxe);
        let subtype: LotSubtype = serde_json::from_str(r#""strata""#).unwrap();
        assert_eq!(subtype, LotSubtype::Other("strata".to_string()));
        assert_eq!(
            serde_json::to_string(&LotSubtype::BattleAxe).unwrap(),
            r#""battle_axe""#
        );
        for subtype in [
            LotSubtype::Standard,
            LotSubtype::BattleAxe,
            LotSubtype::Corner,
            LotSubtype::Irregular,
        ] {
            assert_eq!(LotSubtype::from_code(subtype.as_code()), subtype);
        }
    }

    #[test]
    fn only_specific_subtypes_have_fixed_labels() {
        assert_eq!(
            LotSubtype::BattleAxe.fixed_label(),
            Some(LotLabel::RestrictedAccess)
        );
        assert_eq!(LotSubtype::Standard.fixed_label(), None);
        assert_eq!(LotSubtype::Other("x".into()).fixed_label(), None);
    }

    #[test]
    fn labels_round_trip_through_strings() {
        for label in [
            LotLabel::RestrictedAccess,
            LotLabel::FrontWiderTapered,
            LotLabel::RearWiderTapered,
            LotLabel::Irregular,
            LotLabel::Corner,
            LotLabel::Unclassified,
            LotLabel::Subtype("strata".into()),
        ] {
            let s: String = label.clone().into();
            assert_eq!(LotLabel::from(s), label);
        }
    }

    #[test]
    fn regularity_bands() {
        let rules = LotRules::default();
        assert_eq!(rules.regularity_class(0.95), RegularityClass::Regular);
        assert_eq!(rules.regularity_class(0.85), RegularityClass::MildlyIrregular);
        assert_eq!(rules.regularity_class(0.65), RegularityClass::Irregular);
        assert_eq!(RegularityClass::MildlyIrregular.to_string(), "mildly irregular");
    }
}
