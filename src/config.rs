use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use json::JsonValue;

use crate::{
    color::Transfer,
    error::{DaltonlensError, Result},
    filter::{Backend, DaltonizeParams, Filter},
    hsv::{HsvParams, HueQuantization},
    simulation::Deficiency,
    transform::CpuStrategy,
};

/// Everything a run needs besides the pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ProcessConfig {
    pub filter: Filter,
    pub transfer: Transfer,
    pub backend: Backend,
}

impl ProcessConfig {
    /// Parses a JSON document. Missing keys fall back to their defaults,
    /// `severity` is clamped to [0, 1] and `saturation_scale` to >= 0.
    pub fn from_json(json_string: &str) -> Result<ProcessConfig> {
        let json = json::parse(json_string)?;
        if !json.is_object() {
            return config_error("top level should be an object");
        }

        let deficiency = match json["deficiency"].as_str() {
            Some(s) => parse_deficiency(s)?,
            None if json["deficiency"].is_null() => Deficiency::default(),
            None => return config_error("Couldn't parse deficiency"),
        };
        let severity = match json["severity"].as_f32() {
            Some(val) => val,
            None if json["severity"].is_null() => 1.0,
            None => return config_error("Couldn't parse severity"),
        };
        let simulate_only = match json["simulate_only"].as_bool() {
            Some(val) => val,
            None if json["simulate_only"].is_null() => false,
            None => return config_error("Couldn't parse simulate_only"),
        };
        let params = DaltonizeParams::clamped(deficiency, severity, simulate_only);

        let hue_shift = match json["hue_shift"].as_f32() {
            Some(val) => val,
            None if json["hue_shift"].is_null() => 0.0,
            None => return config_error("Couldn't parse hue_shift"),
        };
        let saturation_scale = match json["saturation_scale"].as_f32() {
            Some(val) => val,
            None if json["saturation_scale"].is_null() => 1.0,
            None => return config_error("Couldn't parse saturation_scale"),
        };
        let hue_quantization = match json["hue_quantization"].as_u32() {
            Some(level) => parse_hue_level(level)?,
            None if json["hue_quantization"].is_null() => HueQuantization::None,
            None => return config_error("Couldn't parse hue_quantization"),
        };
        let hsv = HsvParams::clamped(hue_shift, saturation_scale, hue_quantization);

        let filter = match json["filter"].as_str() {
            Some(s) => parse_filter(s, params, hsv)?,
            None if json["filter"].is_null() => Filter::Daltonize(params),
            None => return config_error("Couldn't parse filter"),
        };
        let transfer = match json["transfer"].as_str() {
            Some(s) => parse_transfer(s)?,
            None if json["transfer"].is_null() => Transfer::default(),
            None => return config_error("Couldn't parse transfer"),
        };
        let backend = match json["backend"].as_str() {
            Some(s) => parse_backend(s)?,
            None if json["backend"].is_null() => Backend::default(),
            None => return config_error("Couldn't parse backend"),
        };

        Ok(ProcessConfig {
            filter,
            transfer,
            backend,
        })
    }

    pub fn to_json(&self) -> String {
        let mut data = JsonValue::new_object();

        data["filter"] = filter_name(&self.filter).into();
        if let Filter::Daltonize(params) = self.filter {
            data["deficiency"] = params.deficiency.into();
            data["severity"] = params.severity.into();
            data["simulate_only"] = params.simulate_only.into();
        }
        if let Filter::HsvTransform(params) = self.filter {
            data["hue_shift"] = params.hue_shift.into();
            data["saturation_scale"] = params.saturation_scale.into();
            data["hue_quantization"] = params.hue_quantization.as_u32().into();
        }
        data["transfer"] = self.transfer.into();
        data["backend"] = self.backend.into();

        data.pretty(2)
    }

    pub fn read_config(path: impl AsRef<Path>) -> Result<ProcessConfig> {
        let mut file = File::open(path)?;
        let mut buff = String::new();
        file.read_to_string(&mut buff)?;

        ProcessConfig::from_json(&buff)
    }

    pub fn write_config(&self, path: impl AsRef<Path>) -> Result {
        let mut file = File::create(path)?;
        file.write_all(self.to_json().as_bytes())?;
        Ok(())
    }
}

fn config_error<T>(msg: &str) -> Result<T> {
    Err(DaltonlensError::Config(String::from(msg)))
}

/// `simulate` is a daltonize filter with `simulate_only` forced on.
pub fn parse_filter(s: &str, params: DaltonizeParams, hsv: HsvParams) -> Result<Filter> {
    match s {
        "normal" => Ok(Filter::Normal),
        "daltonize" => Ok(Filter::Daltonize(params)),
        "simulate" => Ok(Filter::Daltonize(DaltonizeParams {
            simulate_only: true,
            ..params
        })),
        "switch_cbcr" => Ok(Filter::SwitchCbCr),
        "switch_and_flip_cbcr" => Ok(Filter::SwitchAndFlipCbCr),
        "hsv_transform" => Ok(Filter::HsvTransform(hsv)),
        _ => config_error("Not recognized filter"),
    }
}

pub fn parse_deficiency(s: &str) -> Result<Deficiency> {
    s.parse().map_err(DaltonlensError::Config)
}

/// `0`, `1` or `2`.
pub fn parse_hue_quantization(s: &str) -> Result<HueQuantization> {
    match s.parse() {
        Ok(level) => parse_hue_level(level),
        Err(_) => config_error("hue quantization should be 0, 1 or 2"),
    }
}

fn parse_hue_level(level: u32) -> Result<HueQuantization> {
    match HueQuantization::from_level(level) {
        Some(quantization) => Ok(quantization),
        None => config_error("hue quantization should be 0, 1 or 2"),
    }
}

pub fn parse_transfer(s: &str) -> Result<Transfer> {
    match s {
        "legacy" => Ok(Transfer::Legacy),
        "srgb" => Ok(Transfer::Srgb),
        _ => config_error("Not recognized transfer"),
    }
}

pub fn parse_backend(s: &str) -> Result<Backend> {
    match s {
        "cpu" => Ok(Backend::Cpu(CpuStrategy::Seq)),
        "cpu_par" => Ok(Backend::Cpu(CpuStrategy::Par)),
        "auto_cpu" => Ok(Backend::CpuAuto),
        "gpu" => Ok(Backend::Gpu),
        "auto" => Ok(Backend::Auto),
        _ => config_error("Not recognized backend"),
    }
}

fn filter_name(filter: &Filter) -> &'static str {
    match filter {
        Filter::Daltonize(_) => "daltonize",
        other => other.name(),
    }
}

impl From<Deficiency> for JsonValue {
    fn from(deficiency: Deficiency) -> Self {
        JsonValue::String(String::from(deficiency.name()))
    }
}

impl From<Transfer> for JsonValue {
    fn from(transfer: Transfer) -> Self {
        match transfer {
            Transfer::Legacy => JsonValue::String(String::from("legacy")),
            Transfer::Srgb => JsonValue::String(String::from("srgb")),
        }
    }
}

impl From<Backend> for JsonValue {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Cpu(CpuStrategy::Seq) => JsonValue::String(String::from("cpu")),
            Backend::Cpu(CpuStrategy::Par) => JsonValue::String(String::from("cpu_par")),
            Backend::CpuAuto => JsonValue::String(String::from("auto_cpu")),
            Backend::Gpu => JsonValue::String(String::from("gpu")),
            Backend::Auto => JsonValue::String(String::from("auto")),
        }
    }
}
