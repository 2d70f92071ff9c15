#![allow(dead_code)]
//! Shared fixtures for the integration tests.
//!
//! Builders panic on bad input instead of returning `Result`; they exist for
//! readable assertions, not production use.

use std::sync::Arc;

use pcbook::model::Cpu;
use pcbook::{Filter, InMemoryLaptopStore, Laptop, LaptopService, Memory, MemoryUnit};
use uuid::Uuid;

/// Fluent builder for [`Laptop`] fixtures. Starts from a cheap, weak,
/// uniquely identified laptop.
pub struct LaptopBuilder {
    laptop: Laptop,
}

impl LaptopBuilder {
    pub fn new() -> Self {
        Self {
            laptop: Laptop {
                id: Uuid::new_v4().to_string(),
                brand: "Dell".to_string(),
                name: "Latitude".to_string(),
                cpu: Cpu {
                    brand: "Intel".to_string(),
                    name: "Core i5-9400F".to_string(),
                    number_cores: 2,
                    number_threads: 4,
                    min_ghz: 2.0,
                    max_ghz: 3.0,
                },
                ram: Memory::new(4, MemoryUnit::Gigabyte),
                price_usd: 1000.0,
                release_year: 2019,
                ..Laptop::default()
            },
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.laptop.id = id.into();
        self
    }

    pub fn without_id(self) -> Self {
        self.id("")
    }

    pub fn price(mut self, price_usd: f64) -> Self {
        self.laptop.price_usd = price_usd;
        self
    }

    pub fn cores(mut self, cores: u32) -> Self {
        self.laptop.cpu.number_cores = cores;
        self
    }

    pub fn ghz(mut self, min_ghz: f64) -> Self {
        self.laptop.cpu.min_ghz = min_ghz;
        self
    }

    pub fn ram(mut self, value: u64, unit: MemoryUnit) -> Self {
        self.laptop.ram = Memory::new(value, unit);
        self
    }

    pub fn build(self) -> Laptop {
        self.laptop
    }
}

/// A laptop that satisfies [`demo_filter`].
pub fn strong_laptop() -> Laptop {
    LaptopBuilder::new()
    .price(2500.0)
    .cores(8)
    .ghz(3.0)
    .ram(16, MemoryUnit::Gigabyte)
    .build()
}

/// A laptop that fails [`demo_filter`] on RAM alone.
pub fn low_ram_laptop() -> Laptop {
    LaptopBuilder::new()
    .price(2500.0)
    .cores(8)
    .ghz(3.0)
    .ram(4096, MemoryUnit::Megabyte)
    .build()
}

/// The filter the demo client searches with.
pub fn demo_filter() -> Filter {
    Filter {
        max_price_usd: 3000.0,
        min_cpu_cores: 4,
        min_cpu_ghz: 2.5,
        min_ram: Memory::new(8, MemoryUnit::Gigabyte),
    }
}

pub fn new_service() -> LaptopService<InMemoryLaptopStore> {
    LaptopService::new(Arc::new(InMemoryLaptopStore::new()))
}
