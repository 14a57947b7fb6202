use std::ops::Index;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use super::OamObjectIndex;

static DEAD_READ_ONLY_BYTE: u8 = 0xFF;

/// This wrapper type is used to communicate that the VRAM should be indexed into when indexing
/// into VRam. Since there is state that determines what gets indexed into, this type is used
/// rather than making the field `pub(crate)`/`pub(super)`.
pub(super) struct CpuVramIndex(pub u16);

/// This wrapper type is used to communicate that the OAM should be indexed into when indexing
/// into VRam. Since there is state that determines what gets indexed into, this type is used
/// rather than making the field `pub(crate)`/`pub(super)`.
pub(super) struct CpuOamIndex(pub u16);

/// The discriminants match the value that the mode has in the bottom two bits of the STAT
/// register.
#[repr(u8)]
#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, derive_more::IsVariant, Serialize, Deserialize,
)]
pub enum PpuMode {
    /// Also refered to as "Mode 0" in the pandocs.
    #[default]
    HBlank = 0,
    /// Also refered to as "Mode 1" in the pandocs.
    VBlank = 1,
    /// Also refered to as "Mode 2" in the pandocs.
    OamScan = 2,
    /// Also refered to as "Mode 3" in the pandocs.
    Drawing = 3,
}

#[serde_as]
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct VRam {
    /// The main video RAM. Accessible through the address range 0x8000 through 0x9FFF.
    #[serde_as(as = "serde_with::Bytes")]
    pub vram: Box<[u8; 0x2000]>,
    /// The Object Attribute Map. Accessible through the address range 0xFE00 through 0xFE9F.
    /// Each of the 40 objects takes up 4 bytes: y pos, x pos, tile index, and attributes.
    #[serde(serialize_with = "crate::utils::serialize_slices_as_one")]
    #[serde(deserialize_with = "crate::utils::deserialize_slices_as_one")]
    pub oam: Box<[[u8; 4]; 40]>,
    /// The mode that the PPU is currently in. This mode is set when the PPU is ticked and
    /// determines if the VRAM and OAM can be accessed by the CPU.
    pub status: PpuMode,
    /// Set while an OAM DMA is running. The CPU can not see the OAM during this time.
    pub(super) dma_active: bool,
}

impl VRam {
    pub(super) fn new() -> Self {
        Self {
            vram: Box::new([0; 0x2000]),
            oam: Box::new([[0; 4]; 40]),
            status: PpuMode::VBlank,
            dma_active: false,
        }
    }

    fn oam_locked(&self) -> bool {
        self.dma_active || matches!(self.status, PpuMode::OamScan | PpuMode::Drawing)
    }

    pub(super) fn write_vram(&mut self, CpuVramIndex(index): CpuVramIndex, value: u8) {
        if !self.status.is_drawing() {
            self.vram[index as usize - 0x8000] = value;
        }
    }

    pub(super) fn write_oam(&mut self, CpuOamIndex(index): CpuOamIndex, value: u8) {
        if !self.oam_locked() {
            let i = index as usize - 0xFE00;
            self.oam[i / 4][i % 4] = value;
        }
    }

    /// Used by the OAM DMA, which ignores the PPU mode.
    pub(super) fn dma_write(&mut self, index: u8, value: u8) {
        let i = index as usize;
        self.oam[i / 4][i % 4] = value;
    }

    /// Returns the two bytes that make up one row of a tile. `addr` is the absolute address of
    /// the first byte of the tile.
    pub(crate) fn tile_row(&self, addr: u16, row: u8) -> (u8, u8) {
        let i = (addr as usize - 0x8000) + 2 * row as usize;
        (self.vram[i], self.vram[i + 1])
    }

    /// Returns the tile index stored in one of the two tile maps.
    pub(crate) fn tile_map(&self, second_map: bool, x: u8, y: u8) -> u8 {
        let base = if second_map { 0x1C00 } else { 0x1800 };
        self.vram[base + 32 * (y as usize / 8) + (x as usize / 8)]
    }
}

impl Index<CpuVramIndex> for VRam {
    type Output = u8;

    fn index(&self, CpuVramIndex(index): CpuVramIndex) -> &Self::Output {
        if self.status.is_drawing() {
            &DEAD_READ_ONLY_BYTE
        } else {
            &self.vram[index as usize - 0x8000]
        }
    }
}

impl Index<CpuOamIndex> for VRam {
    type Output = u8;

    fn index(&self, CpuOamIndex(index): CpuOamIndex) -> &Self::Output {
        if self.oam_locked() {
            &DEAD_READ_ONLY_BYTE
        } else {
            let i = index as usize - 0xFE00;
            &self.oam[i / 4][i % 4]
        }
    }
}

/* --------- Indexing types use by the PPU --------- */

impl Index<OamObjectIndex> for VRam {
    type Output = [u8; 4];

    fn index(&self, OamObjectIndex(index): OamObjectIndex) -> &Self::Output {
        &self.oam[index as usize]
    }
}
