use core::fmt;

/// Video timing profile.
///
/// PAL consoles run 50 more vblank scanlines than NTSC ones; every scanline
/// threshold of the PPU state machine is shifted by that amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Region {
    /// North American / Japanese timing.
    #[default]
    Ntsc,
    /// European timing.
    Pal,
}

impl Region {
    /// Extra vblank scanlines inserted before the pre-render line.
    pub fn vblank_extension(self) -> i32 {
        match self {
            Region::Ntsc => 0,
            Region::Pal => 50,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Region::Ntsc => "ntsc",
            Region::Pal => "pal",
        };
        f.write_str(s)
    }
}

/// Frame post-processing switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderOptions {
    /// Blank the leftmost and rightmost 8 columns, hidden on most TVs.
    pub clip_tv_column: bool,
    /// Blank the top and bottom 8 rows, hidden on most TVs.
    pub clip_tv_row: bool,
    /// Draw a marker on the row and column of the recorded sprite-0 hit.
    pub show_sprite0_hit: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            clip_tv_column: true,
            clip_tv_row: false,
            show_sprite0_hit: false,
        }
    }
}
