//! Domain types used across bestfit crates.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Number of decimal places every resolved price is rounded to.
pub const PRICE_DECIMALS: i32 = 6;

/// Round a price half-away-from-zero to [`PRICE_DECIMALS`] places.
pub fn round_price(price: f64) -> f64 {
    let scale = 10f64.powi(PRICE_DECIMALS);
    (price * scale).round() / scale
}

/// Generates a closed string enum with `as_str`, `Display`, `FromStr`,
/// and string-based serde impls.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(ValidationError::UnknownValue {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_enum! {
    /// Processor architecture supported by an instance type.
    pub enum Architecture as "architecture" {
        I386 => "i386",
        X86_64 => "x86_64",
        Arm64 => "arm64",
        X86_64Mac => "x86_64_mac",
    }
}

string_enum! {
    /// Billing model an instance type can be launched under.
    pub enum UsageClass as "usage class" {
        OnDemand => "on-demand",
        Spot => "spot",
    }
}

impl Default for UsageClass {
    fn default() -> Self {
        UsageClass::OnDemand
    }
}

string_enum! {
    /// Operating system as the on-demand pricing service names it.
    pub enum OperatingSystem as "operating system" {
        Linux => "Linux",
        Rhel => "RHEL",
        Suse => "SUSE",
        Windows => "Windows",
    }
}

string_enum! {
    /// Product description as the spot-history service names it.
    pub enum ProductDescription as "product description" {
        LinuxUnix => "Linux/UNIX",
        RedHat => "Red Hat Enterprise Linux",
        SuseLinux => "SUSE Linux",
        Windows => "Windows",
        LinuxUnixVpc => "Linux/UNIX (Amazon VPC)",
        RedHatVpc => "Red Hat Enterprise Linux (Amazon VPC)",
        SuseLinuxVpc => "SUSE Linux (Amazon VPC)",
        WindowsVpc => "Windows (Amazon VPC)",
    }
}

impl ProductDescription {
    /// The operating system whose on-demand price covers this product.
    pub fn operating_system(&self) -> OperatingSystem {
        match self {
            ProductDescription::LinuxUnix | ProductDescription::LinuxUnixVpc => OperatingSystem::Linux,
            ProductDescription::RedHat | ProductDescription::RedHatVpc => OperatingSystem::Rhel,
            ProductDescription::SuseLinux | ProductDescription::SuseLinuxVpc => OperatingSystem::Suse,
            ProductDescription::Windows | ProductDescription::WindowsVpc => OperatingSystem::Windows,
        }
    }
}

string_enum! {
    /// How multiple spot price points collapse into one price.
    pub enum SpotPriceStrategy as "spot price strategy" {
        Min => "min",
        Max => "max",
        Average => "average",
    }
}

impl Default for SpotPriceStrategy {
    fn default() -> Self {
        SpotPriceStrategy::Min
    }
}

// ── Catalog ───────────────────────────────────────────────────────

/// Immutable descriptor of one instance type in a region's catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceTypeSpec {
    pub instance_type: String,
    pub vcpu: f64,
    pub memory_gb: f64,
    pub architectures: BTreeSet<Architecture>,
    pub usage_classes_supported: BTreeSet<UsageClass>,
    #[serde(default)]
    pub is_burstable: bool,
    #[serde(default)]
    pub is_current_generation: bool,
    #[serde(default)]
    pub instance_storage_supported: bool,
    #[serde(default)]
    pub supported_zones: BTreeSet<String>,
}

impl InstanceTypeSpec {
    /// Family prefix of the instance type (`m5` for `m5.large`).
    pub fn family(&self) -> &str {
        instance_family(&self.instance_type)
    }
}

/// Family prefix of an instance type name.
pub fn instance_family(instance_type: &str) -> &str {
    instance_type
        .split_once('.')
        .map_or(instance_type, |(family, _)| family)
}

// ── Pricing ───────────────────────────────────────────────────────

string_enum! {
    /// Where a price quote came from.
    pub enum PriceSource as "price source" {
        OnDemand => "on-demand",
        Spot => "spot",
    }
}

impl From<UsageClass> for PriceSource {
    fn from(class: UsageClass) -> Self {
        match class {
            UsageClass::OnDemand => PriceSource::OnDemand,
            UsageClass::Spot => PriceSource::Spot,
        }
    }
}

/// Resolved price for one instance type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceQuote {
    pub instance_type: String,
    /// Hourly price, rounded to [`PRICE_DECIMALS`] places.
    #[serde(with = "price_format")]
    pub price: f64,
    pub source: PriceSource,
    /// Set when a single zone determined the price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Latest observed spot price per zone.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub zone_prices: BTreeMap<String, f64>,
}

// ── Interruption frequency ───────────────────────────────────────

string_enum! {
    /// Published spot interruption buckets, ordered from least to most risky.
    pub enum InterruptionRate as "interruption rate" {
        UnderFive => "<5%",
        FiveToTen => "5-10%",
        TenToFifteen => "10-15%",
        FifteenToTwenty => "15-20%",
        OverTwenty => ">20%",
    }
}

impl InterruptionRate {
    /// Bucket for a bucket index (0..=4) as published by the provider.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Percentage range covered by this bucket.
    pub fn range(&self) -> (u8, u8) {
        match self {
            InterruptionRate::UnderFive => (0, 5),
            InterruptionRate::FiveToTen => (5, 10),
            InterruptionRate::TenToFifteen => (10, 15),
            InterruptionRate::FifteenToTwenty => (15, 20),
            InterruptionRate::OverTwenty => (21, 100),
        }
    }
}

/// Spot interruption frequency of an instance type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterruptionFrequency {
    pub min: u8,
    pub max: u8,
    pub rate: InterruptionRate,
}

impl From<InterruptionRate> for InterruptionFrequency {
    fn from(rate: InterruptionRate) -> Self {
        let (min, max) = rate.range();
        Self { min, max, rate }
    }
}

impl InterruptionFrequency {
    /// Whether this frequency is acceptable under a ceiling of `max_percent`.
    ///
    /// Ceilings of 21 and above admit the `>20%` bucket.
    pub fn admits(&self, max_percent: u8) -> bool {
        self.min <= max_percent
    }
}

// ── Selection result ─────────────────────────────────────────────

/// One entry of the selector's answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionResult {
    pub instance_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "option_price_format")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interruption_frequency: Option<InterruptionFrequency>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub zone_prices: BTreeMap<String, f64>,
}

impl SelectionResult {
    /// A result carrying only the instance type name.
    pub fn bare(instance_type: impl Into<String>) -> Self {
        Self {
            instance_type: instance_type.into(),
            price: None,
            interruption_frequency: None,
            zone_prices: BTreeMap::new(),
        }
    }
}

/// Prices travel as fixed-precision decimal strings.
mod price_format {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::PRICE_DECIMALS;

    pub fn serialize<S: Serializer>(price: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:.*}", PRICE_DECIMALS as usize, price))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => Ok(n),
        }
    }
}

mod option_price_format {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(price: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match price {
            Some(p) => super::price_format::serialize(p, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "super::price_format")] f64);
        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(p)| p))
    }
}
