use std::fmt;

/// Bounding box for board/field images.
pub const FIELD_MAX_DIM: u32 = 1024;
/// Bounding box for every other image category.
pub const DEFAULT_MAX_DIM: u32 = 512;

/// Logical bucket an uploaded asset is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Cover,
    Field,
    Rules,
    Chip,
    DeckBack,
    DeckCard,
    Object,
}

impl AssetCategory {
    /// Directory (object key prefix) for this category.
    pub fn dir(self) -> &'static str {
        match self {
            Self::Cover | Self::Field => "games",
            Self::Rules => "games/rules",
            Self::Chip => "games/chips",
            Self::DeckBack => "games/decks",
            Self::DeckCard => "games/decks/cards",
            Self::Object => "games/objects",
        }
    }

    /// How uploads in this category are normally stored.
    pub fn default_mode(self) -> StoreMode {
        match self {
            Self::Rules => StoreMode::Raw,
            Self::Field => StoreMode::Image {
                max_dim: FIELD_MAX_DIM,
            },
            _ => StoreMode::Image {
                max_dim: DEFAULT_MAX_DIM,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Field => "field",
            Self::Rules => "rules",
            Self::Chip => "chip",
            Self::DeckBack => "deck-back",
            Self::DeckCard => "deck-card",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage mode for an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Decode, flatten to RGB, shrink to fit `max_dim`×`max_dim`, re-encode as JPEG.
    Image { max_dim: u32 },
    /// Store the bytes unchanged.
    Raw,
}
