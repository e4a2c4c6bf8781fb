//! Picture processing unit.
//!
//! The PPU is driven one cycle at a time by [`Ppu::step_cycles`] and renders
//! lazily: background rows are fetched at the end of the scanline before they
//! are shown, while sprites and the background composite are only produced
//! when something could change the picture ([`Ppu::trigger_rendering`]) or
//! when the frame ends.
//!
//! Scanlines are numbered internally with vblank first:
//!
//! | line      | meaning                                  |
//! |-----------|------------------------------------------|
//! | 0..=18    | vblank                                   |
//! | 19        | dummy line, may drop one cycle           |
//! | 20        | pre-render line, scroll reload, row 0    |
//! | 21..=260  | visible rows 0..=239                     |
//! | 261       | dead line, vblank flag + NMI countdown   |
//!
//! PAL timing inserts [`Region::vblank_extension`] lines in front of line 19.

mod background_pipeline;
mod buffer;
mod debug_view;
mod mirror_table;
mod name_table;
pub mod palette;
mod registers;
mod savestate;
mod sprite;
mod sprite_pipeline;
mod tile;

use std::path::Path;

pub use debug_view::{PATTERN_VIEW_HEIGHT, PATTERN_VIEW_WIDTH};
pub use mirror_table::MirrorTable;
pub use name_table::NameTable;
pub use palette::{Color, Palette, PaletteTable};
pub use registers::VramAddr;
pub use sprite::{Sprite, SpriteTable};
pub use tile::Tile;

pub(crate) use savestate::PpuState;

use crate::{
    Error, SCREEN_HEIGHT,
    bus::{Interrupt, PpuBus},
    cartridge::{Mirroring, ScanlineClock},
    config::{Region, RenderOptions},
    memory::{
        cpu::SPRITE_DMA_HALT_CYCLES,
        ppu::{
            ATTRIBUTE_OFFSET, CHR_SIZE, NAMETABLE_BASE, NAMETABLE_SIZE, PALETTE_BASE,
            PALETTE_RAM_SIZE, Register, SPRITE_PALETTE_BASE, SPRITE_RAM_SIZE, TILE_BYTES, TILE_COUNT,
        },
    },
    ram::ppu::{SpriteRam, Vram},
    state::{StateReader, StateWriter},
};

use buffer::FrameBuffers;
use registers::{Mask, Registers, Status};

/// PPU cycles per scanline.
pub const CYCLES_PER_SCANLINE: i32 = 341;
/// Cycles the NMI is held back after the vblank flag rises.
const NMI_DELAY: i32 = 9;

const DUMMY_LINE: i32 = 19;
const PRE_RENDER_LINE: i32 = 20;
const FIRST_VISIBLE_LINE: i32 = 21;
const LAST_VISIBLE_LINE: i32 = 260;
const DEAD_LINE: i32 = 261;

const SPRITE_LINE_MARKER: u32 = 0xFF5555;
const HIT_MARKER: u32 = 0x55FF55;

/// NES picture processing unit.
#[derive(Debug, Clone)]
pub struct Ppu {
    regs: Registers,
    vram: Vram,
    sprite_ram: SpriteRam,
    sprites: SpriteTable,
    /// Decoded pattern tables, 256 tiles each.
    tiles: Vec<Tile>,
    /// Physical name tables; logical quadrants map onto them through `mirror`.
    name_tables: [NameTable; 4],
    mirror: MirrorTable,
    /// `None` until the first [`Ppu::set_mirroring`] after a reset.
    mirroring: Option<Mirroring>,
    palette: PaletteTable,
    image_palette: [u32; 16],
    sprite_palette: [u32; 16],
    buffers: FrameBuffers,

    scanline: i32,
    cur_x: i32,
    last_rendered: i32,
    nmi_counter: i32,
    request_end_frame: bool,
    dummy_cycle_toggle: bool,

    /// Sprite 0 already hit during this frame.
    hit_spr0: bool,
    spr0_hit_x: i32,
    spr0_hit_y: i32,

    /// `row_tiles`/`row_attribs` hold the fetches of the current tile row.
    valid_tile_data: bool,
    row_tiles: [u16; 32],
    row_attribs: [u8; 32],

    region: Region,
    vblank_add: i32,
    options: RenderOptions,
    /// Presenter scales in software and wants changed rows flagged.
    track_dirty: bool,
    request_render_all: bool,
    frame_count: u64,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new(Region::default(), RenderOptions::default())
    }
}

impl Ppu {
    pub fn new(region: Region, options: RenderOptions) -> Self {
        let mut ppu = Self {
            regs: Registers::default(),
            vram: Vram::new(),
            sprite_ram: SpriteRam::new(),
            sprites: SpriteTable::default(),
            tiles: vec![Tile::default(); TILE_COUNT],
            name_tables: Default::default(),
            mirror: MirrorTable::identity(),
            mirroring: None,
            palette: PaletteTable::default(),
            image_palette: [0; 16],
            sprite_palette: [0; 16],
            buffers: FrameBuffers::default(),
            scanline: 0,
            cur_x: 0,
            last_rendered: -1,
            nmi_counter: 0,
            request_end_frame: false,
            dummy_cycle_toggle: false,
            hit_spr0: false,
            spr0_hit_x: -1,
            spr0_hit_y: -1,
            valid_tile_data: false,
            row_tiles: [0; 32],
            row_attribs: [0; 32],
            region,
            vblank_add: region.vblank_extension(),
            options,
            track_dirty: false,
            request_render_all: false,
            frame_count: 0,
        };
        ppu.update_palettes();
        ppu.start_frame();
        ppu
    }

    /// Power-on state: memories, registers, counters, decoded caches,
    /// emphasis and mirroring are all cleared.
    ///
    /// A palette loaded with [`Ppu::load_palette`] is kept.
    pub fn reset(&mut self) {
        let palette = self.palette.base().clone();
        *self = Self::new(self.region, self.options);
        self.palette.set_base(palette);
        self.update_palettes();
        self.start_frame();
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Reads a CPU-visible port. Write-only ports read as zero.
    pub fn read(&mut self, addr: u16, bus: &mut PpuBus<'_>) -> u8 {
        match Register::from_cpu_addr(addr) {
            Some(Register::Status) => self.regs.read_status(),
            Some(Register::SpriteData) => self.sprite_ram.load(usize::from(self.regs.sprite_addr)),
            Some(Register::Data) => self.read_data(bus),
            Some(_) => 0,
            None => {
                tracing::debug!(addr = format_args!("{addr:#06X}"), "read outside the PPU ports");
                0
            }
        }
    }

    /// Writes a CPU-visible port.
    pub fn write(&mut self, addr: u16, value: u8, bus: &mut PpuBus<'_>) {
        match Register::from_cpu_addr(addr) {
            Some(Register::Control) => {
                self.trigger_rendering();
                self.regs.write_control(value);
            }
            Some(Register::Mask) => self.write_mask(value),
            Some(Register::Status) => {}
            Some(Register::SpriteAddr) => self.regs.sprite_addr = value,
            Some(Register::SpriteData) => {
                let addr = self.regs.sprite_addr;
                self.store_sprite_byte(addr, value);
                self.regs.sprite_addr = addr.wrapping_add(1);
            }
            Some(Register::Scroll) => {
                self.trigger_rendering();
                self.regs.vram.write_scroll(value);
            }
            Some(Register::Addr) => self.write_address(value, bus),
            Some(Register::Data) => self.write_data(value, bus),
            Some(Register::SpriteDma) => self.sprite_dma(value, bus),
            None => {
                tracing::debug!(addr = format_args!("{addr:#06X}"), value, "write outside the PPU ports");
            }
        }
    }

    /// Advances the PPU by `cycles` PPU cycles.
    pub fn step_cycles(&mut self, cycles: u32, bus: &mut PpuBus<'_>) {
        self.track_dirty = bus.video.scaling_enabled() && !bus.video.hw_scaling();
        for _ in 0..cycles {
            self.tick(bus);
        }
    }

    /// Selects the name table layout. Rows rendered so far keep the old one.
    pub fn set_mirroring(&mut self, mode: Mirroring) {
        if self.mirroring == Some(mode) {
            return;
        }
        self.trigger_rendering();
        self.mirroring = Some(mode);
        self.mirror = MirrorTable::build(mode);
        tracing::debug!(?mode, "name table mirroring changed");
    }

    pub fn mirroring(&self) -> Option<Mirroring> {
        self.mirroring
    }

    /// Renders every visible row between the last render point and the
    /// row currently being scanned.
    pub fn trigger_rendering(&mut self) {
        let line = self.line();
        if (FIRST_VISIBLE_LINE..=LAST_VISIBLE_LINE).contains(&line) {
            let row = line - FIRST_VISIBLE_LINE;
            self.render_frame_partially(self.last_rendered + 1, row - self.last_rendered);
            self.last_rendered = row;
        }
    }

    /// Copies CHR data into pattern memory and re-decodes the touched tiles.
    pub fn load_pattern_bank(&mut self, addr: u16, data: &[u8]) {
        self.trigger_rendering();
        let start = usize::from(addr);
        if start >= CHR_SIZE {
            tracing::debug!(addr, "pattern bank outside pattern memory");
            return;
        }
        let end = (start + data.len()).min(CHR_SIZE);
        if end - start < data.len() {
            tracing::debug!(addr, len = data.len(), "pattern bank truncated");
        }
        self.vram.write_slice(start, &data[..end - start]);
        self.decode_pattern(start, end);
    }

    pub fn frame(&self) -> &[u32] {
        &self.buffers.pixels
    }

    /// Internal scanline index (see the module docs).
    pub fn scanline(&self) -> i32 {
        self.scanline
    }

    pub fn cycle(&self) -> i32 {
        self.cur_x
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Status flags without the read side effects.
    pub fn status(&self) -> u8 {
        self.regs.status.bits()
    }

    /// Recorded sprite-0 hit pixel of the current frame.
    pub fn sprite0_hit(&self) -> Option<(i32, i32)> {
        (self.spr0_hit_x >= 0 && self.spr0_hit_y >= 0).then_some((self.spr0_hit_x, self.spr0_hit_y))
    }

    /// Current scroll counters, also the `$2007` address.
    pub fn vram_address(&self) -> VramAddr {
        self.regs.vram.v
    }

    /// Latched scroll registers.
    pub fn tmp_address(&self) -> VramAddr {
        self.regs.vram.t
    }

    pub fn fine_x(&self) -> u8 {
        self.regs.vram.x
    }

    pub fn write_toggle(&self) -> bool {
        self.regs.vram.w
    }

    pub fn sprite_addr(&self) -> u8 {
        self.regs.sprite_addr
    }

    /// Whether `row` differed from the previous frame when it was last
    /// rendered. Only maintained for software-scaling presenters.
    pub fn scanline_changed(&self, row: usize) -> bool {
        self.buffers.changed_rows.get(row).copied().unwrap_or(false)
    }

    /// Marks every row as changed and stops dirty tracking until
    /// [`Ppu::set_request_render_all`] turns it back on.
    pub fn invalidate_frame_cache(&mut self) {
        self.buffers.invalidate();
        self.request_render_all = true;
    }

    pub fn set_request_render_all(&mut self, value: bool) {
        self.request_render_all = value;
    }

    pub fn palette(&self) -> &PaletteTable {
        &self.palette
    }

    /// Applies a color adjustment and refreshes the image palettes.
    pub fn adjust_colors(&mut self, hue: i32, saturation: i32, lightness: i32, contrast: i32) {
        self.palette.adjust(hue, saturation, lightness, contrast);
        self.update_palettes();
    }

    /// Loads an external palette file; see [`PaletteTable::load_palette`].
    pub fn load_palette(&mut self, path: impl AsRef<Path>) -> bool {
        let loaded = self.palette.load_palette(path);
        self.update_palettes();
        loaded
    }

    /// Background palette as packed RGB.
    pub fn image_palette(&self) -> &[u32; 16] {
        &self.image_palette
    }

    /// Sprite palette as packed RGB.
    pub fn sprite_palette(&self) -> &[u32; 16] {
        &self.sprite_palette
    }

    pub fn vram(&self) -> &Vram {
        &self.vram
    }

    pub fn sprite_ram(&self) -> &SpriteRam {
        &self.sprite_ram
    }

    pub fn sprites(&self) -> &SpriteTable {
        &self.sprites
    }

    pub fn name_table(&self, index: usize) -> &NameTable {
        &self.name_tables[index & 3]
    }

    pub fn tile(&self, index: usize) -> &Tile {
        &self.tiles[index % TILE_COUNT]
    }

    pub fn state_save(&self, out: &mut StateWriter) -> Result<(), Error> {
        out.put(&PpuState::capture(self))
    }

    /// Decodes and validates a PPU record without touching `self`.
    pub(crate) fn decode_state(input: &mut StateReader<'_>) -> Result<PpuState, Error> {
        let state: PpuState = input.take()?;
        state.validate()?;
        Ok(state)
    }

    pub fn state_load(&mut self, input: &mut StateReader<'_>) -> Result<(), Error> {
        let state = Self::decode_state(input)?;
        self.apply_state(state);
        Ok(())
    }

    /// Replaces pattern/name table/palette memory and sprite memory. The
    /// decoded caches are rebuilt by the PPU record applied afterwards.
    pub(crate) fn restore_memory(&mut self, vram: Vram, sprite_ram: SpriteRam) {
        self.vram = vram;
        self.sprite_ram = sprite_ram;
    }

    #[inline]
    fn line(&self) -> i32 {
        self.scanline - self.vblank_add
    }

    /// Row whose background is fetched at the end of the current line.
    #[inline]
    fn upcoming_row(&self) -> i32 {
        self.line() - PRE_RENDER_LINE
    }

    fn tick(&mut self, bus: &mut PpuBus<'_>) {
        if self.line() - FIRST_VISIBLE_LINE == self.spr0_hit_y
            && self.cur_x == self.spr0_hit_x
            && self.regs.mask.sprites_visible()
        {
            self.regs.status.insert(Status::SPRITE_ZERO_HIT);
        }

        if self.request_end_frame {
            self.nmi_counter -= 1;
            if self.nmi_counter == 0 {
                self.request_end_frame = false;
                self.start_vblank(bus);
            }
        }

        self.cur_x += 1;
        if self.cur_x == CYCLES_PER_SCANLINE {
            self.cur_x = 0;
            self.end_scanline(bus);
        }
    }

    fn end_scanline(&mut self, bus: &mut PpuBus<'_>) {
        let mask = self.regs.mask;
        match self.line() {
            DUMMY_LINE => {
                if self.dummy_cycle_toggle && mask.rendering_enabled() {
                    self.cur_x = 1;
                }
                self.dummy_cycle_toggle = !self.dummy_cycle_toggle;
            }
            PRE_RENDER_LINE => {
                self.regs.status.remove(Status::VERTICAL_BLANK | Status::SPRITE_ZERO_HIT);
                self.hit_spr0 = false;
                self.spr0_hit_x = -1;
                self.spr0_hit_y = -1;

                if mask.rendering_enabled() {
                    self.regs.vram.v = self.regs.vram.t;
                    if mask.background_visible() {
                        self.render_background_row(0);
                    }
                }
                if mask.background_visible() && mask.sprites_visible() {
                    self.check_sprite0(0);
                }
                if mask.rendering_enabled() {
                    self.clock_mapper(-1, bus);
                }
            }
            line @ FIRST_VISIBLE_LINE..=LAST_VISIBLE_LINE => {
                let row = line - PRE_RENDER_LINE;
                if mask.background_visible() {
                    self.render_background_row(row);
                    if !self.hit_spr0 && mask.sprites_visible() && self.sprite0_covers(row) {
                        self.hit_spr0 = self.check_sprite0(row);
                    }
                }
                if mask.rendering_enabled() {
                    self.clock_mapper(line - FIRST_VISIBLE_LINE, bus);
                }
            }
            DEAD_LINE => {
                self.regs.status.insert(Status::VERTICAL_BLANK);
                self.request_end_frame = true;
                self.nmi_counter = NMI_DELAY;
                self.scanline = -1;
            }
            _ => {}
        }
        self.scanline += 1;
    }

    fn clock_mapper(&mut self, row: i32, bus: &mut PpuBus<'_>) {
        let clock = ScanlineClock {
            row,
            rendering: self.regs.mask.rendering_enabled(),
        };
        if let Some(mapper) = bus.mapper.as_deref_mut()
            && mapper.clock_irq_counter(clock)
        {
            bus.cpu.request_interrupt(Interrupt::Irq);
        }
    }

    fn start_vblank(&mut self, bus: &mut PpuBus<'_>) {
        if self.regs.control.nmi_enabled() {
            bus.cpu.request_interrupt(Interrupt::Nmi);
        }

        let last_row = SCREEN_HEIGHT as i32 - 1;
        if self.last_rendered < last_row {
            self.render_frame_partially(self.last_rendered + 1, last_row - self.last_rendered);
        }
        self.end_frame();
        bus.video.image_ready(&self.buffers.pixels, false);

        self.last_rendered = -1;
        self.frame_count += 1;
        self.start_frame();
    }

    fn start_frame(&mut self) {
        let color = self.background_color();
        self.buffers.start_frame(color);
    }

    fn background_color(&self) -> u32 {
        let mask = self.regs.mask;
        if !mask.monochrome() {
            return self.image_palette[0];
        }
        match mask.emphasis() {
            1 => 0x00FF00,
            2 => 0x0000FF,
            4 => 0xFF0000,
            _ => 0,
        }
    }

    /// Post-processing applied once per frame: debug overlay, then clipping.
    fn end_frame(&mut self) {
        if self.options.show_sprite0_hit {
            let sprite = *self.sprites.get(0);
            if (0..256).contains(&sprite.x) && (0..240).contains(&sprite.y) {
                self.draw_crosshair(sprite.x as usize, sprite.y as usize, SPRITE_LINE_MARKER);
            }
            if let Some((x, y)) = self.sprite0_hit()
                && x < 256
                && y < 240
            {
                self.draw_crosshair(x as usize, y as usize, HIT_MARKER);
            }
        }

        if self.options.clip_tv_column || self.regs.mask.clips_left_column() {
            self.buffers.fill_rect(0..8, 0..SCREEN_HEIGHT, 0);
        }
        if self.options.clip_tv_column {
            self.buffers.fill_rect(248..256, 0..SCREEN_HEIGHT, 0);
        }
        if self.options.clip_tv_row {
            self.buffers.fill_rect(0..256, 0..8, 0);
            self.buffers.fill_rect(0..256, SCREEN_HEIGHT - 8..SCREEN_HEIGHT, 0);
        }
    }

    fn draw_crosshair(&mut self, x: usize, y: usize, color: u32) {
        self.buffers.fill_rect(0..256, y..y + 1, color);
        self.buffers.fill_rect(x..x + 1, 0..SCREEN_HEIGHT, color);
    }

    /// Composites rows `start..start + count`: back sprites, opaque
    /// background, front sprites.
    fn render_frame_partially(&mut self, start: i32, count: i32) {
        let rows = start.clamp(0, SCREEN_HEIGHT as i32) as usize
            ..(start + count).clamp(0, SCREEN_HEIGHT as i32) as usize;
        let mask = self.regs.mask;
        if !rows.is_empty() {
            if mask.sprites_visible() {
                self.render_sprites(start, count, true);
            }
            if mask.background_visible() {
                self.buffers.composite_background(rows.clone());
            }
            if mask.sprites_visible() {
                self.render_sprites(start, count, false);
            }
            if self.track_dirty && !self.request_render_all {
                self.buffers.track_changes(rows);
            }
        }
        self.valid_tile_data = false;
    }

    fn write_mask(&mut self, value: u8) {
        self.trigger_rendering();
        self.regs.mask = Mask::from_bits_retain(value);
        if !self.regs.mask.monochrome() {
            self.palette.set_emphasis(self.regs.mask.emphasis());
        }
        self.update_palettes();
    }

    fn store_sprite_byte(&mut self, addr: u8, value: u8) {
        self.sprite_ram.write(usize::from(addr), value);
        self.sprites.write(addr, value);
        if addr < 4 {
            self.check_sprite0(self.upcoming_row());
        }
    }

    fn sprite_dma(&mut self, page: u8, bus: &mut PpuBus<'_>) {
        let base = usize::from(page) << 8;
        for addr in usize::from(self.regs.sprite_addr)..SPRITE_RAM_SIZE {
            let value = bus.cpu_mem.load(base + addr);
            self.store_sprite_byte(addr as u8, value);
        }
        bus.cpu.halt_cycles(SPRITE_DMA_HALT_CYCLES);
    }

    fn write_address(&mut self, value: u8, bus: &mut PpuBus<'_>) {
        if self.regs.vram.w {
            self.trigger_rendering();
        }
        if self.regs.vram.write_addr(value) {
            self.check_sprite0(self.upcoming_row());
        }
        self.notify_latch(self.regs.vram.v.raw(), bus);
    }

    fn read_data(&mut self, bus: &mut PpuBus<'_>) -> u8 {
        let addr = self.regs.vram.v.raw();
        let resolved = self.mirror.resolve(addr);
        let value = if resolved < PALETTE_BASE {
            let previous = self.regs.read_buffer;
            self.regs.read_buffer = self.vram.load(usize::from(resolved));
            self.notify_latch(addr, bus);
            previous
        } else {
            self.vram.load(usize::from(resolved))
        };
        self.regs.vram.v.increment(self.regs.control.vram_increment());
        value
    }

    fn write_data(&mut self, value: u8, bus: &mut PpuBus<'_>) {
        self.trigger_rendering();
        let addr = self.regs.vram.v.raw();
        if addr >= NAMETABLE_BASE {
            self.mirrored_write(addr, value);
        } else {
            self.write_mem(addr, value);
            self.notify_latch(addr, bus);
        }
        self.regs.vram.v.increment(self.regs.control.vram_increment());
    }

    fn notify_latch(&self, addr: u16, bus: &mut PpuBus<'_>) {
        if usize::from(addr) < CHR_SIZE
            && let Some(mapper) = bus.mapper.as_deref_mut()
        {
            mapper.latch_access(addr);
        }
    }

    /// Writes through the mirror table. The four universal background
    /// entries are shared with their sprite-palette twins.
    fn mirrored_write(&mut self, addr: u16, value: u8) {
        let target = self.mirror.resolve(addr);
        if (PALETTE_BASE..PALETTE_BASE + PALETTE_RAM_SIZE).contains(&target) && target & 0x3 == 0 {
            let low = target & !0x10;
            self.write_mem(low, value);
            self.write_mem(low | 0x10, value);
        } else {
            self.write_mem(target, value);
        }
    }

    /// Stores a byte at a resolved address and updates the decoded view
    /// that depends on it.
    fn write_mem(&mut self, addr: u16, value: u8) {
        self.vram.write(usize::from(addr), value);
        match addr {
            0x0000..0x2000 => self.decode_pattern(usize::from(addr), usize::from(addr) + 1),
            0x2000..0x3000 => {
                let offset = addr - NAMETABLE_BASE;
                let table = self.mirror.quadrant(usize::from(offset / NAMETABLE_SIZE));
                let local = offset % NAMETABLE_SIZE;
                if local < ATTRIBUTE_OFFSET {
                    self.name_tables[table].write_tile_index(usize::from(local), value);
                    self.check_sprite0(self.upcoming_row());
                } else {
                    self.name_tables[table].write_attribute(usize::from(local - ATTRIBUTE_OFFSET), value);
                }
            }
            0x3F00..0x3F20 => self.update_palettes(),
            _ => {}
        }
    }

    /// Re-decodes every tile overlapping pattern bytes `start..end`.
    fn decode_pattern(&mut self, start: usize, end: usize) {
        let first = start / TILE_BYTES;
        let last = end.div_ceil(TILE_BYTES).min(TILE_COUNT);
        for index in first..last {
            let base = index * TILE_BYTES;
            let tile = &mut self.tiles[index];
            for y in 0..8 {
                tile.set_scanline(y, self.vram.load(base + y), self.vram.load(base + 8 + y));
            }
        }
    }

    /// Refreshes both 16-color palettes from palette memory.
    fn update_palettes(&mut self) {
        let index_mask = if self.regs.mask.monochrome() { 0x30 } else { 0x3F };
        for i in 0..16 {
            let image = self.vram.load(usize::from(PALETTE_BASE) + i) & index_mask;
            let sprite = self.vram.load(usize::from(SPRITE_PALETTE_BASE) + i) & index_mask;
            self.image_palette[i] = self.palette.entry(image);
            self.sprite_palette[i] = self.palette.entry(sprite);
        }
    }
}
