use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// Unit a [`Memory`] quantity is expressed in.
///
/// `Unknown` is the zero value a client gets when it omits the unit; it
/// normalizes to zero bits.
#[derive(Archive, RkyvDeserialize, RkyvSerialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[archive(check_bytes)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryUnit {
    #[default]
    Unknown,
    Bit,
    Byte,
    Kilobyte,
    Megabyte,
    Gigabyte,
    Terabyte,
}

impl MemoryUnit {
    /// Left shift that converts one unit of `self` into bits.
    pub const fn bit_shift(self) -> Option<u32> {
        match self {
            MemoryUnit::Unknown => None,
            MemoryUnit::Bit => Some(0),
            MemoryUnit::Byte => Some(3),
            MemoryUnit::Kilobyte => Some(13), // 2^10 * 2^3
            MemoryUnit::Megabyte => Some(23),
            MemoryUnit::Gigabyte => Some(33),
            MemoryUnit::Terabyte => Some(43),
        }
    }
}

impl From<&ArchivedMemoryUnit> for MemoryUnit {
    fn from(unit: &ArchivedMemoryUnit) -> Self {
        match unit {
            ArchivedMemoryUnit::Unknown => MemoryUnit::Unknown,
            ArchivedMemoryUnit::Bit => MemoryUnit::Bit,
            ArchivedMemoryUnit::Byte => MemoryUnit::Byte,
            ArchivedMemoryUnit::Kilobyte => MemoryUnit::Kilobyte,
            ArchivedMemoryUnit::Megabyte => MemoryUnit::Megabyte,
            ArchivedMemoryUnit::Gigabyte => MemoryUnit::Gigabyte,
            ArchivedMemoryUnit::Terabyte => MemoryUnit::Terabyte,
        }
    }
}

impl std::fmt::Display for MemoryUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryUnit::Unknown => write!(f, "?"),
            MemoryUnit::Bit => write!(f, "bit"),
            MemoryUnit::Byte => write!(f, "B"),
            MemoryUnit::Kilobyte => write!(f, "KB"),
            MemoryUnit::Megabyte => write!(f, "MB"),
            MemoryUnit::Gigabyte => write!(f, "GB"),
            MemoryUnit::Terabyte => write!(f, "TB"),
        }
    }
}

/// A quantity of storage in a stated unit.
#[derive(Archive, RkyvDeserialize, RkyvSerialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[archive(check_bytes)]
pub struct Memory {
    pub value: u64,
    #[serde(default)]
    pub unit: MemoryUnit,
}

impl Memory {
    pub const fn new(value: u64, unit: MemoryUnit) -> Self {
        Self { value, unit }
    }
}

impl std::fmt::Display for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

#[derive(Archive, RkyvDeserialize, RkyvSerialize, Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[archive(check_bytes)]
#[serde(default)]
pub struct Cpu {
    pub brand: String,
    pub name: String,
    pub number_cores: u32,
    pub number_threads: u32,
    pub min_ghz: f64,
    pub max_ghz: f64,
}

#[derive(Archive, RkyvDeserialize, RkyvSerialize, Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[archive(check_bytes)]
#[serde(default)]
pub struct Gpu {
    pub brand: String,
    pub name: String,
    pub min_ghz: f64,
    pub max_ghz: f64,
    pub memory: Memory,
}

#[derive(Archive, RkyvDeserialize, RkyvSerialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[archive(check_bytes)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageDriver {
    #[default]
    Unknown,
    Hdd,
    Ssd,
}

#[derive(Archive, RkyvDeserialize, RkyvSerialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[archive(check_bytes)]
#[serde(default)]
pub struct Storage {
    pub driver: StorageDriver,
    pub memory: Memory,
}

#[derive(Archive, RkyvDeserialize, RkyvSerialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[archive(check_bytes)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Panel {
    #[default]
    Unknown,
    Ips,
    Oled,
}

#[derive(Archive, RkyvDeserialize, RkyvSerialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[archive(check_bytes)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Archive, RkyvDeserialize, RkyvSerialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[archive(check_bytes)]
#[serde(default)]
pub struct Screen {
    pub size_inch: f32,
    pub resolution: Resolution,
    pub panel: Panel,
    pub multitouch: bool,
}

/// The catalog item.
///
/// An empty `id` means "not assigned yet"; the service fills it in on create.
#[derive(Archive, RkyvDeserialize, RkyvSerialize, Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[archive(check_bytes)]
#[serde(default)]
pub struct Laptop {
    pub id: String,
    pub brand: String,
    pub name: String,
    pub cpu: Cpu,
    pub ram: Memory,
    pub gpus: Vec<Gpu>,
    pub storages: Vec<Storage>,
    pub screen: Screen,
    pub weight_kg: f64,
    pub price_usd: f64,
    pub release_year: u32,

    /// Unix timestamp (seconds) of the last edit made by the producer.
    pub updated_at: u64,
}

/// Search predicate. Built per request, never stored.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct Filter {
    pub max_price_usd: f64,
    pub min_cpu_cores: u32,
    pub min_cpu_ghz: f64,
    pub min_ram: Memory,
}

// --- Request / response shapes ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CreateLaptopRequest {
    pub laptop: Laptop,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateLaptopResponse {
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FindLaptopRequest {
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FindLaptopResponse {
    pub laptop: Option<Laptop>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct SearchLaptopRequest {
    pub filter: Filter,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchLaptopResponse {
    pub laptop: Laptop,
}

impl From<Laptop> for SearchLaptopResponse {
    fn from(laptop: Laptop) -> Self {
        Self { laptop }
    }
}
