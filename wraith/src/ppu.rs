use heapless::Vec as InlineVec;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    instruction::InterruptOp,
    mem::{vram::PpuMode, MemoryMap, OamObjectIndex},
    utils::{check_bit, check_bit_const},
};

/// A completed screen. Each entry is a shade from 0 (lightest) to 3 (darkest), i.e. the colour
/// after the palette has been applied.
pub type Framebuffer = [[u8; 160]; 144];

/// The number of dots in a single scanline, including HBlank.
pub const DOTS_PER_LINE: u16 = 456;
/// The number of dots in a whole frame, VBlank included.
pub const DOTS_PER_FRAME: u32 = 70224;

const OAM_SCAN_DOTS: u16 = 80;
const DRAWING_DOTS: u16 = 172;
const HBLANK_DOTS: u16 = 204;

/// The Pixel Processing Unit
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ppu {
    /// The state machine that controls the timings of when memory is locked and when lines are
    /// drawn.
    inner: PpuInner,
    /// The internal scanline, 0 through 153. This only differs from LY on line 153.
    line: u8,
    /// The line of the window that is drawn next. Only advances on lines where the window is
    /// drawn.
    window_line: u8,
    /// Set once WY <= LY during a frame. Cleared at the start of every frame.
    window_triggered: bool,
    /// Whether LY == LYC was true after the last dot. Used to find rising edges.
    lyc_match: bool,
    /// The objects found during the last OAM scan, in OAM order.
    objects: InlineVec<OamObject, 10>,
    /// The frame that is being drawn.
    #[serde(serialize_with = "crate::utils::serialize_slices_as_one")]
    #[serde(deserialize_with = "crate::utils::deserialize_slices_as_one")]
    back: Box<Framebuffer>,
    /// The last completed frame.
    #[serde(serialize_with = "crate::utils::serialize_slices_as_one")]
    #[serde(deserialize_with = "crate::utils::deserialize_slices_as_one")]
    front: Box<Framebuffer>,
    frame_count: u64,
}

/// Each variant counts the dots spent in that state so far on the current line.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum PpuInner {
    OamScan { dots: u16 },
    Drawing { dots: u16 },
    HBlank { dots: u16 },
    VBlank { dots: u16 },
    /// The LCD is disabled. Nothing advances.
    Off,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    /// The state that the boot ROM leaves the PPU in: near the end of the last VBlank line, after
    /// LY has already wrapped to 0.
    pub fn new() -> Self {
        Self {
            inner: PpuInner::VBlank { dots: 400 },
            line: 153,
            window_line: 0,
            window_triggered: false,
            lyc_match: true,
            objects: InlineVec::new(),
            back: Box::new([[0; 160]; 144]),
            front: Box::new([[0; 160]; 144]),
            frame_count: 0,
        }
    }

    /// The last completed frame.
    pub fn frame(&self) -> &Framebuffer {
        &self.front
    }

    /// The number of times that VBlank has been entered.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The internal scanline. This is 153 for the whole last line even though LY reads 0 for most
    /// of it.
    pub fn line(&self) -> u8 {
        self.line
    }

    /// The position within the current scanline, 0 through 455.
    pub fn line_dot(&self) -> u16 {
        match self.inner {
            PpuInner::OamScan { dots } => dots,
            PpuInner::Drawing { dots } => OAM_SCAN_DOTS + dots,
            PpuInner::HBlank { dots } => OAM_SCAN_DOTS + DRAWING_DOTS + dots,
            PpuInner::VBlank { dots } => dots,
            PpuInner::Off => 0,
        }
    }

    pub fn mode(&self) -> PpuMode {
        self.inner.mode()
    }

    /// Advances the PPU by the given number of dots.
    pub fn tick(&mut self, cycles: u8, mem: &mut MemoryMap) {
        for _ in 0..cycles {
            self.tick_dot(mem);
        }
    }

    fn tick_dot(&mut self, mem: &mut MemoryMap) {
        match (mem.io.lcd_enabled(), self.inner) {
            (false, PpuInner::Off) => return,
            (false, _) => {
                self.turn_off(mem);
                return;
            }
            (true, PpuInner::Off) => self.turn_on(mem),
            (true, _) => {}
        }
        match self.inner {
            PpuInner::OamScan { dots } if dots + 1 == OAM_SCAN_DOTS => {
                self.inner = PpuInner::Drawing { dots: 0 };
                self.set_mode(mem);
                self.render_line(mem);
            }
            PpuInner::OamScan { dots } => self.inner = PpuInner::OamScan { dots: dots + 1 },
            PpuInner::Drawing { dots } if dots + 1 == DRAWING_DOTS => {
                self.inner = PpuInner::HBlank { dots: 0 };
                self.set_mode(mem);
                self.stat_interrupt::<3>(mem);
            }
            PpuInner::Drawing { dots } => self.inner = PpuInner::Drawing { dots: dots + 1 },
            PpuInner::HBlank { dots } if dots + 1 == HBLANK_DOTS => {
                self.line += 1;
                mem.io.lcd_y = self.line;
                if self.line == 144 {
                    self.enter_vblank(mem);
                } else {
                    self.enter_oam_scan(mem);
                }
            }
            PpuInner::HBlank { dots } => self.inner = PpuInner::HBlank { dots: dots + 1 },
            PpuInner::VBlank { dots } if dots + 1 == DOTS_PER_LINE => {
                if self.line == 153 {
                    self.line = 0;
                    mem.io.lcd_y = 0;
                    self.window_line = 0;
                    self.window_triggered = false;
                    self.enter_oam_scan(mem);
                } else {
                    self.line += 1;
                    mem.io.lcd_y = self.line;
                    self.inner = PpuInner::VBlank { dots: 0 };
                }
            }
            PpuInner::VBlank { dots } => {
                // LY wraps early on the last line
                if self.line == 153 && dots + 1 == 4 {
                    mem.io.lcd_y = 0;
                }
                self.inner = PpuInner::VBlank { dots: dots + 1 };
            }
            PpuInner::Off => {}
        }
        let lyc_match = mem.io.check_y_cmp();
        if lyc_match && !self.lyc_match {
            self.stat_interrupt::<6>(mem);
        }
        self.lyc_match = lyc_match;
    }

    fn enter_oam_scan(&mut self, mem: &mut MemoryMap) {
        self.inner = PpuInner::OamScan { dots: 0 };
        self.set_mode(mem);
        self.stat_interrupt::<5>(mem);
        self.scan_oam(mem);
    }

    fn enter_vblank(&mut self, mem: &mut MemoryMap) {
        self.inner = PpuInner::VBlank { dots: 0 };
        self.set_mode(mem);
        mem.request_interrupt(InterruptOp::VBlank);
        self.stat_interrupt::<4>(mem);
        // The OAM scan source also fires on the first VBlank line.
        self.stat_interrupt::<5>(mem);
        std::mem::swap(&mut self.front, &mut self.back);
        self.frame_count += 1;
        trace!("Finished frame {}", self.frame_count);
    }

    fn turn_off(&mut self, mem: &mut MemoryMap) {
        self.inner = PpuInner::Off;
        self.line = 0;
        self.window_line = 0;
        self.window_triggered = false;
        mem.io.lcd_y = 0;
        self.set_mode(mem);
    }

    /// The LCD starts back up at the top of the screen.
    fn turn_on(&mut self, mem: &mut MemoryMap) {
        self.inner = PpuInner::OamScan { dots: 0 };
        self.line = 0;
        mem.io.lcd_y = 0;
        self.set_mode(mem);
        self.scan_oam(mem);
    }

    /// Mirrors the current mode into the STAT register and the VRAM access gates.
    fn set_mode(&self, mem: &mut MemoryMap) {
        let mode = self.inner.mode();
        mem.vram.status = mode;
        mem.io.lcd_status = (mem.io.lcd_status & 0b1111_1100) | mode as u8;
    }

    /// Requests the LCD interrupt if the given STAT source is enabled.
    fn stat_interrupt<const B: u8>(&self, mem: &mut MemoryMap) {
        if check_bit_const::<B>(mem.io.lcd_status) {
            mem.request_interrupt(InterruptOp::LCD);
        }
    }

    /// Collects the (up to) ten objects that overlap the current line, in OAM order.
    fn scan_oam(&mut self, mem: &MemoryMap) {
        self.objects.clear();
        let lcdc = mem.io.lcd_control;
        if !check_bit_const::<1>(lcdc) {
            return;
        }
        let height = if check_bit_const::<2>(lcdc) { 16 } else { 8 };
        let y = self.line as u16 + 16;
        for index in 0..40 {
            let obj = OamObject::new(index, mem[OamObjectIndex(index)]);
            let top = obj.y as u16;
            if top <= y && y < top + height && self.objects.push(obj).is_err() {
                break;
            }
        }
    }

    /// Composites the current line into the back buffer.
    fn render_line(&mut self, mem: &MemoryMap) {
        let line = self.line;
        let Some(row) = self.back.get_mut(line as usize) else {
            return;
        };
        let io = &mem.io;
        let lcdc = io.lcd_control;
        let (scy, scx) = io.bg_position;
        let [wy, wx] = io.window_position;
        if wy <= line {
            self.window_triggered = true;
        }
        let bg_enabled = check_bit_const::<0>(lcdc);
        let window_active =
            bg_enabled && check_bit_const::<5>(lcdc) && self.window_triggered && wx <= 166;
        let unsigned_tiles = check_bit_const::<4>(lcdc);
        let tile_addr = |tile: u8| -> u16 {
            if unsigned_tiles {
                0x8000 + tile as u16 * 16
            } else {
                0x9000u16.wrapping_add_signed(tile as i8 as i16 * 16)
            }
        };

        // The colour of each background/window pixel before the palette is applied. Objects need
        // this to resolve their priority.
        let mut bg_colors = [0u8; 160];
        let mut window_drawn = false;
        if bg_enabled {
            for (x, color) in bg_colors.iter_mut().enumerate() {
                let x = x as u8;
                let (second_map, map_x, map_y) = if window_active && x as u16 + 7 >= wx as u16 {
                    window_drawn = true;
                    (
                        check_bit_const::<6>(lcdc),
                        (x as u16 + 7 - wx as u16) as u8,
                        self.window_line,
                    )
                } else {
                    (
                        check_bit_const::<3>(lcdc),
                        scx.wrapping_add(x),
                        scy.wrapping_add(line),
                    )
                };
                let tile = mem.vram.tile_map(second_map, map_x, map_y);
                let (lo, hi) = mem.vram.tile_row(tile_addr(tile), map_y % 8);
                *color = pixel_color(lo, hi, map_x % 8);
            }
        }
        if window_drawn {
            self.window_line = self.window_line.wrapping_add(1);
        }

        let bgp = io.monochrome_bg_palette;
        for (shade, color) in row.iter_mut().zip(bg_colors) {
            *shade = apply_palette(bgp, color);
        }

        if self.objects.is_empty() {
            return;
        }
        let tall = check_bit_const::<2>(lcdc);
        // Smaller X draws on top. Ties go to the lower OAM index.
        let mut objects = self.objects.clone();
        objects.sort_unstable_by_key(|obj| (obj.x, obj.index));
        for (x, shade) in row.iter_mut().enumerate() {
            let screen_x = x as u16 + 8;
            let pixel = objects
                .iter()
                .filter(|obj| (obj.x as u16) <= screen_x && screen_x < obj.x as u16 + 8)
                .find_map(|obj| {
                    let col = (screen_x - obj.x as u16) as u8;
                    let color = obj.color_at(line, col, tall, mem);
                    (color != 0).then_some((obj, color))
                });
            let Some((obj, color)) = pixel else {
                continue;
            };
            if obj.behind_background() && bg_colors[x] != 0 {
                continue;
            }
            let palette = io.monochrome_obj_palettes[obj.palette_index()];
            *shade = apply_palette(palette, color);
        }
    }
}

impl PpuInner {
    fn mode(&self) -> PpuMode {
        match self {
            PpuInner::OamScan { .. } => PpuMode::OamScan,
            PpuInner::Drawing { .. } => PpuMode::Drawing,
            PpuInner::HBlank { .. } | PpuInner::Off => PpuMode::HBlank,
            PpuInner::VBlank { .. } => PpuMode::VBlank,
        }
    }
}

/// One entry of the Object Attribute Map.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct OamObject {
    /// The position of this object in OAM. Used to break priority ties.
    index: u8,
    y: u8,
    x: u8,
    tile_index: u8,
    attrs: u8,
}

impl OamObject {
    fn new(index: u8, [y, x, tile_index, attrs]: [u8; 4]) -> Self {
        Self {
            index,
            y,
            x,
            tile_index,
            attrs,
        }
    }

    fn behind_background(&self) -> bool {
        check_bit_const::<7>(self.attrs)
    }

    fn palette_index(&self) -> usize {
        check_bit_const::<4>(self.attrs) as usize
    }

    /// The colour (before the palette) of this object at the given line and column. The caller
    /// ensures the line and column are inside the object.
    fn color_at(&self, line: u8, col: u8, tall: bool, mem: &MemoryMap) -> u8 {
        let height = if tall { 16 } else { 8 };
        let mut row = (line as u16 + 16 - self.y as u16) as u8;
        if check_bit_const::<6>(self.attrs) {
            row = height - 1 - row;
        }
        let col = if check_bit_const::<5>(self.attrs) {
            7 - col
        } else {
            col
        };
        let tile = if tall {
            self.tile_index & 0xFE
        } else {
            self.tile_index
        };
        // Tall objects span two consecutive tiles, so the row can run into the second one.
        let (lo, hi) = mem.vram.tile_row(0x8000 + tile as u16 * 16, row);
        pixel_color(lo, hi, col)
    }
}

/// Returns the 2-bit colour of a pixel in a tile row. Column 0 is the leftmost pixel, which is
/// stored in bit 7 of both bytes.
fn pixel_color(lo: u8, hi: u8, col: u8) -> u8 {
    let bit = 7 - (col & 0x7);
    ((check_bit(hi, bit) as u8) << 1) | check_bit(lo, bit) as u8
}

fn apply_palette(palette: u8, color: u8) -> u8 {
    (palette >> (2 * color)) & 0b11
}
