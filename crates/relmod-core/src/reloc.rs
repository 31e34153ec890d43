//! Address relocation between the vanilla and live address spaces.
//!
//! Fixed addresses taken from the vanilla game only stay valid for the DOL;
//! REL modules (and their BSS) load wherever the OS puts them. Relocation is
//! a pure function over the known vanilla regions plus a [`ModuleMap`] of
//! live base addresses, so it can be exercised without a running game.

use serde::Serialize;
use strum::{Display, FromRepr, IntoStaticStr};

use crate::layout::regions;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, FromRepr, IntoStaticStr,
)]
#[repr(u8)]
pub enum ModuleId {
    Dol = 0,
    MainLoop = 1,
    MainGame = 2,
    SelNgc = 3,
}

/// One vanilla load region: a module's text/data or its BSS.
#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub module: ModuleId,
    pub vanilla_base: u32,
    pub size: u32,
    pub is_bss: bool,
}

impl Region {
    const fn new(module: ModuleId, vanilla_base: u32, size: u32, is_bss: bool) -> Self {
        Self {
            module,
            vanilla_base,
            size,
            is_bss,
        }
    }

    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.vanilla_base && addr < self.vanilla_base + self.size
    }
}

/// Where everything lived in the vanilla game. MainGame and SelNgc share an
/// address range; only one of the two is ever loaded.
pub const VANILLA_REGIONS: [Region; 7] = [
    Region::new(ModuleId::Dol, regions::DOL_BASE, regions::DOL_SIZE, false),
    Region::new(ModuleId::MainLoop, regions::MAINLOOP_BASE, regions::MAINLOOP_SIZE, false),
    Region::new(ModuleId::MainLoop, regions::MAINLOOP_BSS_BASE, regions::MAINLOOP_BSS_SIZE, true),
    Region::new(ModuleId::MainGame, regions::MAINGAME_BASE, regions::MAINGAME_SIZE, false),
    Region::new(ModuleId::MainGame, regions::MAINGAME_BSS_BASE, regions::MAINGAME_BSS_SIZE, true),
    Region::new(ModuleId::SelNgc, regions::SELNGC_BASE, regions::SELNGC_SIZE, false),
    Region::new(ModuleId::SelNgc, regions::SELNGC_BSS_BASE, regions::SELNGC_BSS_SIZE, true),
];

#[derive(Debug, Clone, Copy)]
struct LiveModule {
    module: ModuleId,
    text_base: u32,
    bss_base: u32,
}

/// Live base addresses of the currently loaded modules.
#[derive(Debug, Clone, Default)]
pub struct ModuleMap {
    loaded: Vec<LiveModule>,
}

impl ModuleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map where every module sits at its vanilla base, so relocation is
    /// the identity. Used by offline tooling and tests.
    pub fn vanilla() -> Self {
        let mut map = Self::new();
        map.insert(ModuleId::MainLoop, regions::MAINLOOP_BASE, regions::MAINLOOP_BSS_BASE);
        map.insert(ModuleId::MainGame, regions::MAINGAME_BASE, regions::MAINGAME_BSS_BASE);
        map
    }

    /// Record a loaded module's live text and BSS bases.
    pub fn insert(&mut self, module: ModuleId, text_base: u32, bss_base: u32) {
        self.loaded.retain(|m| m.module != module);
        self.loaded.push(LiveModule {
            module,
            text_base,
            bss_base,
        });
    }

    pub fn is_loaded(&self, module: ModuleId) -> bool {
        module == ModuleId::Dol || self.find(module).is_some()
    }

    fn find(&self, module: ModuleId) -> Option<LiveModule> {
        self.loaded.iter().copied().find(|m| m.module == module)
    }

    /// Translate a vanilla address to its live equivalent, or `None` if no
    /// loaded module owns it. Regions of unloaded modules are skipped, which
    /// matters for the MainGame/SelNgc overlap.
    pub fn relocate(&self, vanilla_addr: u32) -> Option<u32> {
        for region in &VANILLA_REGIONS {
            if !region.contains(vanilla_addr) {
                continue;
            }

            // DOL addresses are absolute.
            if region.module == ModuleId::Dol {
                return Some(vanilla_addr);
            }

            if let Some(live) = self.find(region.module) {
                let base = if region.is_bss {
                    live.bss_base
                } else {
                    live.text_base
                };
                return Some(base + (vanilla_addr - region.vanilla_base));
            }
        }
        None
    }
}
