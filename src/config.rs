use crate::{palette::PALETTE_SIZE, Palette};
use serde::{
    de::{self, Visitor},
    Deserialize,
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}", .0.display())]
    Read(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse config")]
    Parse(#[from] toml::de::Error),
}

/// Export settings, loaded from a TOML file.
///
/// ```toml
/// scale = 4
/// palette = "HERO.PAL"        # raw RGB triplets, relative to the config file
/// # or
/// palette = [[0, 0, 0], [0, 186, 117]]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub palette: Option<PaletteSource>,

    #[serde(default = "default_scale")]
    pub scale: u32,

    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_scale() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palette: None,
            scale: default_scale(),
            base_dir: PathBuf::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteSource {
    File(PathBuf),
    Colors(Vec<[u8; 3]>),
}

impl Config {
    pub fn parse(config: &str) -> Result<Config, ConfigError> {
        Ok(toml::de::from_str(config)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let src =
            fs::read_to_string(path).map_err(|err| ConfigError::Read(path.to_path_buf(), err))?;

        let mut config = Self::parse(&src)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// The configured palette, or the built-in one if none is set.
    pub fn palette(&self) -> Result<Palette, ConfigError> {
        match &self.palette {
            None => Ok(Palette::DEFAULT),
            Some(PaletteSource::Colors(colors)) => Ok(Palette::from_colors(colors)),
            Some(PaletteSource::File(file)) => {
                let path = self.base_dir.join(file);
                let data = fs::read(&path).map_err(|err| ConfigError::Read(path, err))?;
                Ok(Palette::from_slice(&data))
            }
        }
    }
}

impl<'de> Deserialize<'de> for PaletteSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(PaletteSourceVisitor)
    }
}

struct PaletteSourceVisitor;

impl<'de> Visitor<'de> for PaletteSourceVisitor {
    type Value = PaletteSource;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a palette file path or a list of [r, g, b] colors")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(PaletteSource::File(PathBuf::from(value)))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        let mut colors = Vec::new();

        while let Some(color) = seq.next_element::<[u8; 3]>()? {
            if colors.len() == PALETTE_SIZE {
                return Err(de::Error::custom(format!(
                    "Palette has more than {} colors",
                    PALETTE_SIZE
                )));
            }
            colors.push(color);
        }

        Ok(PaletteSource::Colors(colors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.scale, 1);
        assert_eq!(config.palette().unwrap(), Palette::DEFAULT);
    }

    #[test]
    fn palette_as_path() {
        let config = Config::parse("palette = \"HERO.PAL\"\nscale = 3").unwrap();

        assert_eq!(config.scale, 3);
        assert_eq!(
            config.palette,
            Some(PaletteSource::File(PathBuf::from("HERO.PAL")))
        );
    }

    #[test]
    fn palette_as_colors() {
        let config = Config::parse("palette = [[1, 2, 3], [4, 5, 6]]").unwrap();
        let palette = config.palette().unwrap();

        assert_eq!(
            palette.get(crate::palette::ColorIndex::new(1)),
            Rgb([4, 5, 6])
        );
        assert_eq!(
            palette.get(crate::palette::ColorIndex::new(7)),
            Rgb([0, 0, 0])
        );
    }

    #[test]
    fn too_many_colors() {
        let colors = vec!["[0, 0, 0]"; 17].join(", ");
        assert!(Config::parse(&format!("palette = [{}]", colors)).is_err());
    }
}
