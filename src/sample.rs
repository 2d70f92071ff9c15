//! Random but well-formed laptops for demos and tests.
//!
//! Nothing here is used by the store or the service.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::model::{
    Cpu, Gpu, Laptop, Memory, MemoryUnit, Panel, Resolution, Screen, Storage, StorageDriver,
};

/// A laptop with every field populated and a fresh v4 id.
pub fn new_laptop() -> Laptop {
    let mut rng = rand::thread_rng();
    let brand = random_from(&mut rng, &["Apple", "Dell", "Lenovo"]);
    let name = random_laptop_name(&mut rng, brand);

    Laptop {
        id: Uuid::new_v4().to_string(),
        brand: brand.to_string(),
        name: name.to_string(),
        cpu: new_cpu(),
        ram: new_ram(),
        gpus: vec![new_gpu()],
        storages: vec![new_ssd(), new_hdd()],
        screen: new_screen(),
        weight_kg: rng.gen_range(1.0..3.0),
        price_usd: rng.gen_range(1500.0..3500.0),
        release_year: rng.gen_range(2015..=2019),
        updated_at: SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default(),
    }
}

pub fn new_cpu() -> Cpu {
    let mut rng = rand::thread_rng();
    let brand = random_from(&mut rng, &["Intel", "AMD"]);
    let name = match brand {
        "Intel" => random_from(&mut rng, &[
            "Xeon E-2286M",
            "Core i9-9980HK",
            "Core i7-9750H",
            "Core i5-9400F",
            "Core i3-1005G1",
        ]),
        _ => random_from(&mut rng, &[
            "Ryzen 7 PRO 2700U",
            "Ryzen 5 PRO 3500U",
            "Ryzen 3 PRO 3200GE",
        ]),
    };

    let number_cores = rng.gen_range(2..=8);
    let number_threads = rng.gen_range(number_cores..=12);
    let min_ghz = rng.gen_range(2.0..3.5);
    let max_ghz = rng.gen_range(min_ghz..5.0);

    Cpu {
        brand: brand.to_string(),
        name: name.to_string(),
        number_cores,
        number_threads,
        min_ghz,
        max_ghz,
    }
}

pub fn new_gpu() -> Gpu {
    let mut rng = rand::thread_rng();
    let brand = random_from(&mut rng, &["NVIDIA", "AMD"]);
    let name = match brand {
        "NVIDIA" => random_from(&mut rng, &["RTX 2060", "RTX 2070", "GTX 1660-Ti", "GTX 1070"]),
        _ => random_from(&mut rng, &["RX 590", "RX 580", "RX 5700-XT", "RX Vega-56"]),
    };

    let min_ghz = rng.gen_range(1.0..1.5);
    let max_ghz = rng.gen_range(min_ghz..2.0);

    Gpu {
        brand: brand.to_string(),
        name: name.to_string(),
        min_ghz,
        max_ghz,
        memory: Memory::new(rng.gen_range(2..=6), MemoryUnit::Gigabyte),
    }
}

pub fn new_ram() -> Memory {
    Memory::new(rand::thread_rng().gen_range(4..=64), MemoryUnit::Gigabyte)
}

pub fn new_ssd() -> Storage {
    Storage {
        driver: StorageDriver::Ssd,
        memory: Memory::new(rand::thread_rng().gen_range(128..=1024), MemoryUnit::Gigabyte),
    }
}

pub fn new_hdd() -> Storage {
    Storage {
        driver: StorageDriver::Hdd,
        memory: Memory::new(rand::thread_rng().gen_range(1..=6), MemoryUnit::Terabyte),
    }
}

pub fn new_screen() -> Screen {
    let mut rng = rand::thread_rng();
    let height = rng.gen_range(1080..=4320);

    Screen {
        size_inch: rng.gen_range(13.0..17.0),
        resolution: Resolution { width: height * 16 / 9, height },
        panel: if rng.gen_bool(0.5) { Panel::Ips } else { Panel::Oled },
        multitouch: rng.gen_bool(0.5),
    }
}

fn random_laptop_name<R: Rng>(rng: &mut R, brand: &str) -> &'static str {
    match brand {
        "Apple" => random_from(rng, &["Macbook Air", "Macbook Pro"]),
        "Dell" => random_from(rng, &["Latitude", "Vostro", "XPS", "Alienware"]),
        _ => random_from(rng, &["Thinkpad X1", "Thinkpad P1", "Thinkpad P53"]),
    }
}

fn random_from<R: Rng>(rng: &mut R, choices: &[&'static str]) -> &'static str {
    choices.choose(rng).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_laptop_is_well_formed() {
        for _ in 0..50 {
            let laptop = new_laptop();
            let id = Uuid::parse_str(&laptop.id).unwrap();
            assert_eq!(id.get_version_num(), 4);

            assert!(laptop.price_usd >= 1500.0 && laptop.price_usd < 3500.0);
            assert!(laptop.cpu.number_threads >= laptop.cpu.number_cores);
            assert!(laptop.cpu.max_ghz >= laptop.cpu.min_ghz);
            assert_eq!(laptop.ram.unit, MemoryUnit::Gigabyte);
            assert_eq!(laptop.storages.len(), 2);
            assert!(!laptop.brand.is_empty() && !laptop.name.is_empty());
        }
    }

    #[test]
    fn sample_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..100).map(|_| new_laptop().id).collect();
        assert_eq!(ids.len(), 100);
    }
}
