use quire_types::DocumentRole;
use serde::{Deserialize, Serialize};

/// Default lower bound on image size. Anything shorter is almost certainly a
/// truncated download or an error page.
pub const DEFAULT_MIN_IMAGE_BYTES: usize = 1000;

/// Page dimensions in PDF points (1/72 in).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// US letter, 8.5 × 11 in.
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    /// Comic trim, 6.625 × 10.25 in.
    pub const COMIC_TRIM: PageSize = PageSize {
        width: 477.0,
        height: 738.0,
    };

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Page size for each document role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSizes {
    pub customer: PageSize,
    pub lulu_interior: PageSize,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            customer: PageSize::LETTER,
            lulu_interior: PageSize::COMIC_TRIM,
        }
    }
}

impl PageSizes {
    pub fn for_role(&self, role: DocumentRole) -> PageSize {
        match role {
            DocumentRole::Customer => self.customer,
            DocumentRole::LuluInterior => self.lulu_interior,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    pub min_image_bytes: usize,
    pub page_sizes: PageSizes,
    /// Written to the Info dictionary of new documents.
    pub producer: String,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            min_image_bytes: DEFAULT_MIN_IMAGE_BYTES,
            page_sizes: PageSizes::default(),
            producer: "quire".to_string(),
        }
    }
}
