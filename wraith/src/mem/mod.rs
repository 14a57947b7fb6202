use std::ops::Index;

use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::debug;
use tracing::trace;

use crate::config::Config;
use crate::instruction::InterruptOp;
use crate::ButtonInput;

pub mod io;
pub mod mbc;
pub(crate) mod vram;

pub use mbc::MemoryBankController;

use io::IoRegisters;

use self::vram::CpuOamIndex;
use self::vram::CpuVramIndex;
use self::vram::VRam;

/// The number of cycles an OAM DMA takes: 160 bytes, one every 4 cycles.
const OAM_DMA_CYCLES: u16 = 640;

/// This trait is used to abstract over the memory map. This is used during testing, where the CPU
/// runs against a flat, 64 KiB vector.
pub trait MemoryLike {
    fn read_byte(&self, addr: u16) -> u8;

    fn write_byte(&mut self, addr: u16, val: u8);

    /// The interrupts that are both requested and enabled, i.e. `IE & IF`. Only the bottom five
    /// bits are ever set.
    fn pending_interrupts(&self) -> u8 {
        self.read_byte(0xFFFF) & self.read_byte(0xFF0F) & 0x1F
    }

    fn clear_interrupt_req(&mut self, op: InterruptOp) {
        let flags = self.read_byte(0xFF0F);
        self.write_byte(0xFF0F, flags & !op.mask());
    }

    /// Called when the CPU executes STOP.
    fn stop(&mut self) {}

    /// Whether or not the CPU can leave the stopped state.
    fn wake_from_stop(&self) -> bool {
        true
    }
}

#[serde_as]
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMap {
    // The MBC
    mbc: MemoryBankController,
    // The video RAM and Object attribute map
    pub vram: VRam,
    // The working RAM
    #[serde(serialize_with = "crate::utils::serialize_slices_as_one")]
    #[serde(deserialize_with = "crate::utils::deserialize_slices_as_one")]
    wram: Box<[[u8; 0x1000]; 2]>,
    pub(crate) io: IoRegisters,
    // High RAM
    #[serde_as(as = "serde_with::Bytes")]
    hr: [u8; 0x7F],
    /// ADDR FF46
    oam_dma: OamDma,
    /// The interrupt enable register. Bits 0-4 flag where or not certain interrupt handlers can be
    /// called.
    ///  - Bit 0 corresponds to the VBlank interrupt
    ///  - Bit 1 corresponds to the LCD interrupt
    ///  - Bit 2 corresponds to the timer interrupt
    ///  - Bit 3 corresponds to the serial interrupt
    ///  - Bit 4 corresponds to the joypad interrupt
    /// The top three bits are stored but have no effect. When indexed, this register is at 0xFFFF.
    pub ie: u8,
    /// What reads from the unusable region (0xFEA0-0xFEFF) return.
    unusable_fill: u8,
}

impl MemoryLike for MemoryMap {
    /// Reads a byte as the CPU sees it. Mode-gated and DMA-blocked regions read as 0xFF (or, for a
    /// bus conflict, as the byte currently being transferred).
    fn read_byte(&self, addr: u16) -> u8 {
        if self.oam_dma.in_conflict(addr) {
            trace!("DMA bus conflict on read @ 0x{addr:0>4X}");
            return self.oam_dma.last_byte;
        }
        match addr {
            n @ 0x8000..=0x9FFF => self.vram[CpuVramIndex(n)],
            n @ 0xFE00..=0xFE9F => self.vram[CpuOamIndex(n)],
            0xFEA0..=0xFEFF => self.unusable_fill,
            n => self.dma_read_byte(n),
        }
    }

    /// Unlike indexing, this provides control over what gets written. For example, some registers
    /// only have some bits that can be written to, which allows all other bits to be masked out.
    fn write_byte(&mut self, addr: u16, val: u8) {
        if self.oam_dma.in_conflict(addr) {
            trace!("DMA bus conflict on write of 0x{val:0>2X} @ 0x{addr:0>4X}");
            return;
        }
        match addr {
            n @ 0x0000..=0x7FFF => self.mbc.write_byte(n, val),
            n @ 0x8000..=0x9FFF => self.vram.write_vram(CpuVramIndex(n), val),
            n @ 0xA000..=0xBFFF => self.mbc.write_byte(n, val),
            n @ 0xC000..=0xCFFF => self.wram[0][n as usize - 0xC000] = val,
            n @ 0xD000..=0xDFFF => self.wram[1][n as usize - 0xD000] = val,
            // Echo RAM
            n @ 0xE000..=0xEFFF => self.wram[0][n as usize - 0xE000] = val,
            n @ 0xF000..=0xFDFF => self.wram[1][n as usize - 0xF000] = val,
            n @ 0xFE00..=0xFE9F => self.vram.write_oam(CpuOamIndex(n), val),
            // NOTE: This region *should not* actually be accessed
            0xFEA0..=0xFEFF => {}
            0xFF46 => {
                self.io.write_byte(0xFF46, val);
                self.oam_dma.trigger(val);
                self.vram.dma_active = true;
            }
            n @ 0xFF00..=0xFF7F => self.io.write_byte(n, val),
            n @ 0xFF80..=0xFFFE => self.hr[(n - 0xFF80) as usize] = val,
            0xFFFF => self.ie = val,
        }
    }

    fn pending_interrupts(&self) -> u8 {
        self.ie & self.io.interrupt_flags & 0x1F
    }

    fn clear_interrupt_req(&mut self, op: InterruptOp) {
        self.io.clear_interrupt_req(op)
    }

    fn stop(&mut self) {
        self.io.tac.reset_divider()
    }

    fn wake_from_stop(&self) -> bool {
        self.io.any_button_pressed()
    }
}

/// Which of the buses an OAM DMA is reading from. A CPU access on the same bus during the
/// transfer is ignored, and reads see the byte the DMA is moving.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
enum ConflictBus {
    /// ROM and cartridge RAM.
    Cartridge,
    Vram,
    /// The working RAM and its echo.
    Wram,
}

impl ConflictBus {
    fn of(addr: u16) -> Option<Self> {
        match addr {
            0x0000..=0x7FFF | 0xA000..=0xBFFF => Some(Self::Cartridge),
            0x8000..=0x9FFF => Some(Self::Vram),
            0xC000..=0xFDFF => Some(Self::Wram),
            // OAM, IO, and HRAM are never in conflict.
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
struct OamDma {
    read_addr: u16,
    write_addr: u8,
    /// `OAM_DMA_CYCLES` when idle.
    ticks: u16,
    bus: ConflictBus,
    last_byte: u8,
}

impl OamDma {
    fn new() -> Self {
        Self {
            read_addr: 0,
            write_addr: 0,
            ticks: OAM_DMA_CYCLES,
            bus: ConflictBus::Cartridge,
            last_byte: 0xFF,
        }
    }

    fn is_active(&self) -> bool {
        self.ticks < OAM_DMA_CYCLES
    }

    /// Calculates if a read/write is happening on the bus that the transfer is using.
    fn in_conflict(&self, index: u16) -> bool {
        self.is_active() && ConflictBus::of(index) == Some(self.bus)
    }

    fn trigger(&mut self, value: u8) {
        // Sources past the echo RAM (0xE000 and up) are wired to the working RAM.
        let page = if value >= 0xE0 { value - 0x20 } else { value };
        self.read_addr = (page as u16) << 8;
        self.bus = ConflictBus::of(self.read_addr).unwrap_or(ConflictBus::Wram);
        self.write_addr = 0;
        self.ticks = 0;
        debug!("Beginning OAM DMA starting at 0x{:0>4X}", self.read_addr);
    }

    /// Returns the pair of addresses (source address, OAM offset) when a byte should be moved.
    fn tick(&mut self) -> Option<(u16, u8)> {
        if !self.is_active() {
            return None;
        }
        self.ticks += 1;
        if self.ticks % 4 == 0 {
            let digest = (self.read_addr, self.write_addr);
            self.read_addr += 1;
            self.write_addr += 1;
            Some(digest)
        } else {
            None
        }
    }
}

impl MemoryMap {
    pub fn new(mbc: MemoryBankController, config: &Config) -> Self {
        Self {
            mbc,
            vram: VRam::new(),
            wram: Box::new([[0; 0x1000]; 2]),
            io: IoRegisters::new(config),
            hr: [0; 0x7F],
            ie: 0,
            oam_dma: OamDma::new(),
            unusable_fill: config.unusable_fill,
        }
    }

    /// Puts every device back into its post-boot state. The cartridge RAM is kept.
    pub(crate) fn reset(&mut self, config: &Config) {
        self.mbc.reset();
        self.vram = VRam::new();
        self.wram.iter_mut().for_each(|bank| bank.fill(0));
        self.io = IoRegisters::new(config);
        self.hr = [0; 0x7F];
        self.ie = 0;
        self.oam_dma = OamDma::new();
        self.unusable_fill = config.unusable_fill;
    }

    /// Reads a byte without checking for DMA bus conflicts or display-mode gating. This is how the
    /// DMA itself sees memory.
    fn dma_read_byte(&self, index: u16) -> u8 {
        match index {
            0x0000..=0x7FFF => self.mbc.read_byte(index),
            n @ 0x8000..=0x9FFF => self.vram.vram[n as usize - 0x8000],
            n @ 0xA000..=0xBFFF => self.mbc.read_byte(n),
            n @ 0xC000..=0xCFFF => self.wram[0][n as usize - 0xC000],
            n @ 0xD000..=0xDFFF => self.wram[1][n as usize - 0xD000],
            // Echo RAM
            n @ 0xE000..=0xEFFF => self.wram[0][n as usize - 0xE000],
            n @ 0xF000..=0xFDFF => self.wram[1][n as usize - 0xF000],
            n @ 0xFE00..=0xFE9F => {
                let i = n as usize - 0xFE00;
                self.vram.oam[i / 4][i % 4]
            }
            0xFEA0..=0xFEFF => self.unusable_fill,
            n @ 0xFF00..=0xFF7F => self.io.read_byte(n),
            n @ 0xFF80..=0xFFFE => self.hr[(n - 0xFF80) as usize],
            0xFFFF => self.ie,
        }
    }

    /// Returns the highest priority interrupt that is both requested and enabled.
    pub fn pending_interrupt(&self) -> Option<InterruptOp> {
        InterruptOp::from_pending(MemoryLike::pending_interrupts(self))
    }

    pub fn request_interrupt(&mut self, op: InterruptOp) {
        self.io.request_interrupt(op)
    }

    pub fn clear_interrupt(&mut self, op: InterruptOp) {
        self.io.clear_interrupt_req(op)
    }

    pub(crate) fn register_button_input(&mut self, input: ButtonInput) {
        self.io.register_button_input(input)
    }

    pub(crate) fn register_button_release(&mut self, input: ButtonInput) {
        self.io.register_button_release(input)
    }

    /// Advances the timers, serial port, OAM DMA, and cartridge clock by the given number of
    /// cycles.
    pub fn tick(&mut self, cycles: u8) {
        for _ in 0..cycles {
            self.io.tick();
            if let Some((src, dst)) = self.oam_dma.tick() {
                let byte = self.dma_read_byte(src);
                self.oam_dma.last_byte = byte;
                self.vram.dma_write(dst, byte);
            }
        }
        self.vram.dma_active = self.oam_dma.is_active();
        self.mbc.tick(cycles as u32);
    }

    pub fn mbc(&self) -> &MemoryBankController {
        &self.mbc
    }

    pub fn mbc_mut(&mut self) -> &mut MemoryBankController {
        &mut self.mbc
    }

    pub(crate) fn serial_output(&self) -> &[u8] {
        self.io.serial_output()
    }
}

#[cfg(test)]
impl MemoryMap {
    /// Creates a memory map around a ROM-only cartridge that should only be used for testing.
    pub(crate) fn construct() -> Self {
        let rom = crate::rom::test_rom(0x00, 0x00, 0x00, &[]);
        let (mbc, _) = MemoryBankController::new(rom).expect("test ROMs are valid");
        Self::new(mbc, &Config::default())
    }

    pub(crate) fn rom_mut(&mut self) -> &mut Vec<u8> {
        self.mbc.rom_mut()
    }
}

/* --------- Indexing types use by the PPU --------- */

/// A type used to index an object inside of the Object Attribute Map. The inner value of the index
/// notes the object's position in the map and *not* the object's address in memory. This includes
/// the y pos, x pos, tile index, and attributes of the object. This type is only used by the PPU.
pub struct OamObjectIndex(pub u8);

impl Index<OamObjectIndex> for MemoryMap {
    type Output = [u8; 4];

    fn index(&self, index: OamObjectIndex) -> &Self::Output {
        &self.vram[index]
    }
}

#[cfg(test)]
impl MemoryLike for Vec<u8> {
    fn read_byte(&self, addr: u16) -> u8 {
        self[addr as usize]
    }

    fn write_byte(&mut self, addr: u16, val: u8) {
        self[addr as usize] = val;
    }
}
