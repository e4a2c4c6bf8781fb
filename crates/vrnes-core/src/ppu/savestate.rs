use serde::{Deserialize, Serialize};

use super::{
    MirrorTable, NameTable, Ppu, Tile,
    buffer::FRAME_PIXELS,
    registers::{Control, Mask, Status, VramAddr},
};
use crate::{Error, SCREEN_HEIGHT, cartridge::Mirroring, memory::ppu::TILE_COUNT};

/// Serialized PPU record.
///
/// Memories are saved separately; the decoded sprite table and the image
/// palettes are rebuilt from them on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PpuState {
    counters: u16,
    registers: u16,
    fine_x: u8,
    control: u8,
    mask: u8,
    status: u8,
    read_buffer: u8,
    write_toggle: bool,
    mirror: MirrorTable,
    mirroring: Option<Mirroring>,
    sprite_addr: u8,
    scanline: i32,
    cycle: i32,
    last_rendered: i32,
    nmi_counter: i32,
    request_end_frame: bool,
    dummy_cycle_toggle: bool,
    valid_tile_data: bool,
    hit_spr0: bool,
    spr0_hit_x: i32,
    spr0_hit_y: i32,
    row_tiles: [u16; 32],
    row_attribs: [u8; 32],
    background: Vec<u32>,
    pixel_mask: Vec<u16>,
    name_tables: [NameTable; 4],
    tiles: Vec<Tile>,
}

impl PpuState {
    pub(crate) fn capture(ppu: &Ppu) -> Self {
        let regs = &ppu.regs;
        Self {
            counters: regs.vram.v.raw(),
            registers: regs.vram.t.raw(),
            fine_x: regs.vram.x,
            control: regs.control.bits(),
            mask: regs.mask.bits(),
            status: regs.status.bits(),
            read_buffer: regs.read_buffer,
            write_toggle: regs.vram.w,
            mirror: ppu.mirror.clone(),
            mirroring: ppu.mirroring,
            sprite_addr: regs.sprite_addr,
            scanline: ppu.scanline,
            cycle: ppu.cur_x,
            last_rendered: ppu.last_rendered,
            nmi_counter: ppu.nmi_counter,
            request_end_frame: ppu.request_end_frame,
            dummy_cycle_toggle: ppu.dummy_cycle_toggle,
            valid_tile_data: ppu.valid_tile_data,
            hit_spr0: ppu.hit_spr0,
            spr0_hit_x: ppu.spr0_hit_x,
            spr0_hit_y: ppu.spr0_hit_y,
            row_tiles: ppu.row_tiles,
            row_attribs: ppu.row_attribs,
            background: ppu.buffers.background.clone(),
            pixel_mask: ppu.buffers.mask.clone(),
            name_tables: ppu.name_tables.clone(),
            tiles: ppu.tiles.clone(),
        }
    }

    /// Rejects records whose buffers could not back a running PPU.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.background.len() != FRAME_PIXELS || self.pixel_mask.len() != FRAME_PIXELS {
            return Err(Error::CorruptState("frame buffer size"));
        }
        if self.tiles.len() != TILE_COUNT || !self.tiles.iter().all(Tile::is_consistent) {
            return Err(Error::CorruptState("pattern tiles"));
        }
        if !self.name_tables.iter().all(NameTable::is_consistent) {
            return Err(Error::CorruptState("name tables"));
        }
        if !self.mirror.is_complete() {
            return Err(Error::CorruptState("mirror table"));
        }
        if self.row_tiles.iter().any(|&t| usize::from(t) >= TILE_COUNT)
            || self.row_attribs.iter().any(|&a| a > 12 || a % 4 != 0)
        {
            return Err(Error::CorruptState("tile row cache"));
        }
        if !(-1..SCREEN_HEIGHT as i32).contains(&self.last_rendered) {
            return Err(Error::CorruptState("render position"));
        }
        if !(0..super::CYCLES_PER_SCANLINE).contains(&self.cycle) {
            return Err(Error::CorruptState("cycle"));
        }
        Ok(())
    }
}

impl Ppu {
    pub(crate) fn apply_state(&mut self, state: PpuState) {
        let regs = &mut self.regs;
        regs.vram.v = VramAddr::from(state.counters);
        regs.vram.t = VramAddr::from(state.registers);
        regs.vram.x = state.fine_x & 0x7;
        regs.vram.w = state.write_toggle;
        regs.control = Control::from_bits_retain(state.control);
        regs.mask = Mask::from_bits_retain(state.mask);
        regs.status = Status::from_bits_retain(state.status);
        regs.read_buffer = state.read_buffer;
        regs.sprite_addr = state.sprite_addr;

        self.mirror = state.mirror;
        self.mirroring = state.mirroring;
        self.scanline = state.scanline;
        self.cur_x = state.cycle;
        self.last_rendered = state.last_rendered;
        self.nmi_counter = state.nmi_counter;
        self.request_end_frame = state.request_end_frame;
        self.dummy_cycle_toggle = state.dummy_cycle_toggle;
        self.valid_tile_data = state.valid_tile_data;
        self.hit_spr0 = state.hit_spr0;
        self.spr0_hit_x = state.spr0_hit_x;
        self.spr0_hit_y = state.spr0_hit_y;
        self.row_tiles = state.row_tiles;
        self.row_attribs = state.row_attribs;
        self.buffers.background = state.background;
        self.buffers.mask = state.pixel_mask;
        self.name_tables = state.name_tables;
        self.tiles = state.tiles;

        self.sprites.rebuild(&self.sprite_ram);
        if !self.regs.mask.monochrome() {
            self.palette.set_emphasis(self.regs.mask.emphasis());
        }
        self.update_palettes();
        self.buffers.invalidate();
    }
}
