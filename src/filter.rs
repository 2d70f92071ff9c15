use crate::model::{ArchivedLaptop, Filter, Laptop, Memory, MemoryUnit};

/// The handful of laptop properties a [`Filter`] looks at.
///
/// Implemented for both the owned [`Laptop`] and its archived image, so the
/// store can reject candidates without deserializing them first.
pub trait Specs {
    fn price_usd(&self) -> f64;
    fn cpu_cores(&self) -> u32;
    fn cpu_min_ghz(&self) -> f64;
    fn ram_bits(&self) -> u64;
}

/// Normalize a quantity to bits.
///
/// Unknown units normalize to 0. Values too large for a `u64` saturate.
pub fn to_bits(value: u64, unit: MemoryUnit) -> u64 {
    match unit.bit_shift() {
        Some(shift) => value.saturating_mul(1u64 << shift),
        None => 0,
    }
}

impl Memory {
    pub fn to_bits(&self) -> u64 {
        to_bits(self.value, self.unit)
    }
}

/// Returns true when `laptop` satisfies every bound of `filter`.
pub fn matches<L: Specs + ?Sized>(filter: &Filter, laptop: &L) -> bool {
    if laptop.price_usd() > filter.max_price_usd {
        return false;
    }

    if laptop.cpu_cores() < filter.min_cpu_cores {
        return false;
    }

    if laptop.cpu_min_ghz() < filter.min_cpu_ghz {
        return false;
    }

    // Compare in bits since the units may differ
    laptop.ram_bits() >= filter.min_ram.to_bits()
}

impl Specs for Laptop {
    fn price_usd(&self) -> f64 {
        self.price_usd
    }

    fn cpu_cores(&self) -> u32 {
        self.cpu.number_cores
    }

    fn cpu_min_ghz(&self) -> f64 {
        self.cpu.min_ghz
    }

    fn ram_bits(&self) -> u64 {
        self.ram.to_bits()
    }
}

impl Specs for ArchivedLaptop {
    fn price_usd(&self) -> f64 {
        f64::from(self.price_usd)
    }

    fn cpu_cores(&self) -> u32 {
        u32::from(self.cpu.number_cores)
    }

    fn cpu_min_ghz(&self) -> f64 {
        f64::from(self.cpu.min_ghz)
    }

    fn ram_bits(&self) -> u64 {
        to_bits(u64::from(self.ram.value), MemoryUnit::from(&self.ram.unit))
    }
}
