use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use koei_gfx::{
    Archive, BitOrder, BitplaneImage, BitplaneLayout, Config, Face, PackedFile, FACE_HEIGHT,
    FACE_WIDTH,
};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug)]
struct Arguments {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract every entry of an LS11 archive
    Unpack {
        archive: PathBuf,

        #[command(flatten)]
        args: UnpackArgs,
    },

    /// Print the number of entries in an LS11 archive without decoding them
    Count { archive: PathBuf },

    /// Split an uncompressed packed file into its entries
    Split {
        file: PathBuf,

        #[command(flatten)]
        args: UnpackArgs,
    },

    /// Render planar bitmap images to PNG
    Images {
        file: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        #[command(flatten)]
        args: ImageArgs,
    },

    /// Decode TF-DCE face records to PNG images
    Faces {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        args: FaceArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    colog::init();

    match args.command {
        Commands::Unpack { archive, args } => unpack(archive, args)?,
        Commands::Count { archive } => count(archive)?,
        Commands::Split { file, args } => split(file, args)?,
        Commands::Images { file, layout, args } => images(file, layout, args)?,
        Commands::Faces { files, args } => faces(files, args)?,
    }

    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    log::info!(
        "Loaded '{}' with CRC: {:#010x}",
        path.display(),
        crc32fast::hash(&data)
    );

    Ok(data)
}

fn prepare_out_dir(out_dir: &Path, force: bool) -> anyhow::Result<()> {
    if force && out_dir.exists() {
        fs::remove_dir_all(out_dir).with_context(|| "Failed to clean up old output directory")?;
    }
    fs::create_dir(out_dir).with_context(|| "Failed to create output directory")?;

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            Config::load(path).with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

#[derive(Args, Debug, Clone)]
struct UnpackArgs {
    /// The output directory to write the entries to
    #[arg(short, long, default_value = "unpacked")]
    out_dir: PathBuf,

    /// Overwrite the output directory if it already exists
    #[arg(long)]
    force: bool,
}

fn unpack(path: PathBuf, args: UnpackArgs) -> anyhow::Result<()> {
    let data = read_input(&path)?;
    let archive = Archive::parse(&data).with_context(|| "Failed to parse LS11 archive")?;
    log::debug!("Archive header: {:02x?}", archive.header());

    prepare_out_dir(&args.out_dir, args.force)?;

    for (index, record) in archive.records().iter().enumerate() {
        let entry = archive
            .entry(index)
            .with_context(|| format!("Missing entry {}", index))?;

        let path = args.out_dir.join(format!("{:03}.bin", index));
        fs::write(&path, &entry)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        log::info!(
            "Extracted entry {} ({} -> {} bytes): {}",
            index,
            record.compressed_size,
            entry.len(),
            path.display()
        );
    }

    log::info!("Done! Extracted {} entries", archive.len());

    Ok(())
}

fn count(path: PathBuf) -> anyhow::Result<()> {
    let data = read_input(&path)?;
    let count = koei_gfx::count_entries(&data).with_context(|| "Failed to parse LS11 archive")?;

    println!("{}", count);

    Ok(())
}

fn split(path: PathBuf, args: UnpackArgs) -> anyhow::Result<()> {
    let data = read_input(&path)?;
    let packed = PackedFile::parse(&data).with_context(|| "Failed to parse packed file")?;
    log::info!(
        "Found {} entries behind a {} byte table",
        packed.len(),
        packed.header_size()
    );

    prepare_out_dir(&args.out_dir, args.force)?;

    for (index, entry) in packed.iter().enumerate() {
        let path = args.out_dir.join(format!("{:03}.UNPACKED", index));
        fs::write(&path, entry).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    log::info!("Done! Split {} entries", packed.len());

    Ok(())
}

#[derive(Args, Debug, Clone)]
struct LayoutArgs {
    /// Image width in pixels
    #[arg(long)]
    width: u32,

    /// Image height in pixels
    #[arg(long)]
    height: u32,

    /// Bits per pixel, one bitplane each
    #[arg(long, default_value_t = 4)]
    bpp: u8,

    /// Bytes of each plane stored together before the next plane starts
    #[arg(long, default_value_t = 1)]
    align: usize,

    /// Plane 0 holds the lowest bit of each pixel instead of the highest
    #[arg(long)]
    lsb_first: bool,

    /// Pixels are stored as 16x16 tiles
    #[arg(long)]
    tiled: bool,
}

impl From<LayoutArgs> for BitplaneLayout {
    fn from(args: LayoutArgs) -> Self {
        BitplaneLayout {
            width: args.width,
            height: args.height,
            align_length: args.align,
            bpp: args.bpp,
            bit_order: if args.lsb_first {
                BitOrder::LsbFirst
            } else {
                BitOrder::MsbFirst
            },
            tiled: args.tiled,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct ImageArgs {
    /// The output directory to export the images to
    #[arg(short, long, default_value = "images")]
    out_dir: PathBuf,

    /// TOML file providing the palette and scale factor
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Every image is an entry of an LS11 archive
    #[arg(long)]
    ls11: bool,

    /// Bytes to skip before each image of an uncompressed file
    #[arg(long, default_value_t = 0)]
    skip_header: usize,

    /// Overwrite the output directory if it already exists
    #[arg(long)]
    force: bool,
}

fn images(path: PathBuf, layout: LayoutArgs, args: ImageArgs) -> anyhow::Result<()> {
    use indicatif::ParallelProgressIterator;
    use rayon::prelude::*;

    let layout = BitplaneLayout::from(layout);
    let config = load_config(args.config.as_deref())?;
    let palette = config.palette().with_context(|| "Failed to load palette")?;
    let scale = config.scale.max(1);

    let data = read_input(&path)?;
    let images = if args.ls11 {
        Archive::parse(&data)
            .with_context(|| "Failed to parse LS11 archive")?
            .decode_all()
    } else {
        layout
            .blocks(&data, args.skip_header)
            .map(<[u8]>::to_vec)
            .collect()
    };

    prepare_out_dir(&args.out_dir, args.force)?;

    log::info!("Rendering {} images...", images.len());

    images
        .par_iter()
        .enumerate()
        .progress_count(images.len() as u64)
        .try_for_each(|(index, data)| -> anyhow::Result<()> {
            let image = BitplaneImage::decode(data, layout)
                .with_context(|| format!("Failed to decode image {}", index))?;

            let img = image::imageops::resize(
                &image.to_image(&palette),
                image.width() * scale,
                image.height() * scale,
                image::imageops::FilterType::Nearest,
            );

            let path = args.out_dir.join(format!("{:03}.png", index));
            img.save(&path)
                .with_context(|| format!("Failed to save {}", path.display()))?;

            Ok(())
        })?;

    log::info!("Done!");

    Ok(())
}

#[derive(Args, Debug, Clone)]
struct FaceArgs {
    /// The output directory to export the face images to
    #[arg(short, long, default_value = "faces")]
    out_dir: PathBuf,

    /// TOML file providing the palette and scale factor
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overwrite the output directory if it already exists
    #[arg(long)]
    force: bool,
}

fn faces(files: Vec<PathBuf>, args: FaceArgs) -> anyhow::Result<()> {
    use indicatif::ParallelProgressIterator;
    use rayon::prelude::*;

    let config = load_config(args.config.as_deref())?;
    let palette = config.palette().with_context(|| "Failed to load palette")?;
    let scale = config.scale.max(1);

    prepare_out_dir(&args.out_dir, args.force)?;

    log::info!("Decoding {} face records...", files.len());

    files
        .par_iter()
        .progress_count(files.len() as u64)
        .try_for_each(|file| -> anyhow::Result<()> {
            let data =
                fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

            let face = Face::decode(&data);
            if face.is_truncated() {
                log::warn!("{} is truncated", file.display());
            }

            let img = image::imageops::resize(
                &face.to_image(&palette),
                FACE_WIDTH * scale,
                FACE_HEIGHT * scale,
                image::imageops::FilterType::Nearest,
            );

            let name = file
                .file_stem()
                .with_context(|| format!("{} has no file name", file.display()))?;
            let path = args.out_dir.join(name).with_extension("png");
            img.save(&path)
                .with_context(|| format!("Failed to save {}", path.display()))?;

            Ok(())
        })?;

    log::info!("Done!");

    Ok(())
}
