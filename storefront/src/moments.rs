//! Community photo gallery. Public, static.

/// Archive label above the gallery
pub const ARCHIVE_LABEL: &str = "Archive 2024";

/// One gallery tile
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Moment {
    /// Tile id
    pub id: u32,
    /// Caption
    pub title: &'static str,
    /// Credit
    pub photographer: &'static str,
    /// Photo URL
    pub image_url: &'static str,
    /// Grid columns spanned (1 or 2)
    pub cols: u8,
    /// Grid rows spanned (1 or 2)
    pub rows: u8,
}

impl Moment {
    /// Credit line under the caption
    #[must_use]
    pub fn credit(&self) -> String {
        format!("by {}", self.photographer)
    }

    /// Grid cells covered by this tile
    #[must_use]
    pub fn area(&self) -> u32 {
        u32::from(self.cols) * u32::from(self.rows)
    }
}

const fn moment(
    id: u32,
    title: &'static str,
    photographer: &'static str,
    image_url: &'static str,
    (cols, rows): (u8, u8),
) -> Moment {
    Moment {
        id,
        title,
        photographer,
        image_url,
        cols,
        rows,
    }
}

const MOMENTS: [Moment; 7] = [
    moment(1, "Neon Nights", "Sarah Jenkins", "https://picsum.photos/seed/concert1/800/1000", (1, 2)),
    moment(2, "The Great Gathering", "Mike Alwen", "https://picsum.photos/seed/crowd2/1200/800", (2, 1)),
    moment(3, "Solo Performance", "Davide O.", "https://picsum.photos/seed/artist3/800/800", (1, 1)),
    moment(4, "Laser Symphony", "TechVis", "https://picsum.photos/seed/light4/800/1200", (1, 2)),
    moment(5, "Rhythm & Flow", "Elena R.", "https://picsum.photos/seed/dance5/800/800", (1, 1)),
    moment(6, "Open Air Vibes", "DroneShotz", "https://picsum.photos/seed/fest6/1200/800", (2, 1)),
    moment(7, "Digital Gallery", "Artsy Studio", "https://picsum.photos/seed/art7/800/1000", (1, 2)),
];

/// Gallery tiles in display order
#[must_use]
pub const fn moments() -> &'static [Moment] {
    &MOMENTS
}
