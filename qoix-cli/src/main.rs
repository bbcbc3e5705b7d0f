use argh::FromArgs;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use log::{info, warn, Level};
use qoix::{
    ColorSpace, DecodeStatus, Decoded, Format, Header, PixelLayout, PixelSource, QoiDecodeContext,
    QoiEncodeContext,
};
use std::{fs::File, io::BufReader, str::FromStr};

/// QOI and QOI2 cli encoder and decoder.
#[derive(FromArgs)]
struct Cli {
    /// log what the codec is doing
    #[argh(switch, short = 'v')]
    verbose: bool,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Encode(Encode),
    Decode(Decode),
    Info(Info),
}

/// Encodes an image as QOI, or QOI2 with `--qoi2`.
#[derive(FromArgs)]
#[argh(subcommand, name = "encode")]
struct Encode {
    /// input format, optional (png, jpg, bmp)
    #[argh(option)]
    format: Option<ImageKind>,

    /// write a QOI2 stream instead of QOI
    #[argh(switch)]
    qoi2: bool,

    /// mark all channels as linear instead of sRGB
    #[argh(switch)]
    linear: bool,

    /// the input file, a PNG, JPG, or BMP
    #[argh(positional)]
    input: String,
    /// the output file
    #[argh(positional)]
    output: String,
}

/// Decodes a QOI or QOI2 image.
#[derive(FromArgs)]
#[argh(subcommand, name = "decode")]
struct Decode {
    /// output format (png, jpg, bmp)
    #[argh(option)]
    format: ImageKind,

    /// the input file
    #[argh(positional)]
    input: String,
    /// the output file
    #[argh(positional)]
    output: String,
}

/// Prints the header of a QOI or QOI2 image.
#[derive(FromArgs)]
#[argh(subcommand, name = "info")]
struct Info {
    /// the input file
    #[argh(positional)]
    input: String,
}

#[derive(Debug, Clone, Copy)]
enum ImageKind {
    Png,
    Jpg,
    Bmp,
}

impl ImageKind {
    fn image_format(self) -> ImageFormat {
        match self {
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Jpg => ImageFormat::Jpeg,
            ImageKind::Bmp => ImageFormat::Bmp,
        }
    }
}

impl FromStr for ImageKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        #[rustfmt::skip]
        let Some(kind) = s.eq_ignore_ascii_case("png").then_some(ImageKind::Png)
               .or_else(|| s.eq_ignore_ascii_case("jpg").then_some(ImageKind::Jpg))
               .or_else(|| s.eq_ignore_ascii_case("jpeg").then_some(ImageKind::Jpg))
               .or_else(|| s.eq_ignore_ascii_case("bmp").then_some(ImageKind::Bmp))
        else { return Err("invalid string"); };

        Ok(kind)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Cli { verbose, command } = argh::from_env();

    simple_logger::init_with_level(if verbose { Level::Debug } else { Level::Warn })?;

    match command {
        Command::Encode(options) => encode(options),
        Command::Decode(options) => decode(options),
        Command::Info(options) => print_info(options),
    }
}

fn encode(options: Encode) -> Result<(), Box<dyn std::error::Error>> {
    let Encode {
        format,
        qoi2,
        linear,
        input,
        output,
    } = options;

    let image = match format {
        Some(kind) => {
            image::io::Reader::with_format(BufReader::new(File::open(&input)?), kind.image_format())
                .decode()?
        }
        None => image::io::Reader::open(&input)?
            .with_guessed_format()?
            .decode()?,
    };

    let width = image.width();
    let height = image.height();

    let (layout, samples) = match image {
        DynamicImage::ImageLuma8(buffer) => (PixelLayout::GRAY, buffer.into_raw()),
        DynamicImage::ImageLumaA8(buffer) => (PixelLayout::GRAY_ALPHA, buffer.into_raw()),
        DynamicImage::ImageRgb8(buffer) => (PixelLayout::RGB, buffer.into_raw()),
        DynamicImage::ImageRgba8(buffer) => (PixelLayout::RGBA, buffer.into_raw()),
        other if other.color().has_alpha() => (PixelLayout::RGBA, other.into_rgba8().into_raw()),
        other => (PixelLayout::RGB, other.into_rgb8().into_raw()),
    };

    let format = if qoi2 { Format::QOI2 } else { Format::QOI };
    let color_space = if linear {
        ColorSpace::Linear
    } else {
        ColorSpace::Srgb
    };

    println!("Encoding {width}x{height} image as {}", format.name());

    let source =
        PixelSource::from_bytes(width, height, layout, &samples)?.with_color_space(color_space);
    let v = QoiEncodeContext::encode_to_vec(format, &source)?;

    std::fs::write(&output, &v)?;
    println!("Written {} bytes to `{output}`", v.len());

    Ok(())
}

fn decode(options: Decode) -> Result<(), Box<dyn std::error::Error>> {
    let Decode {
        format,
        input,
        output,
    } = options;

    let stream = std::fs::read(&input)?;
    let stream_format = Format::detect(&stream).ok_or("not a QOI or QOI2 file")?;

    println!("Decoding `{input}` as {}", stream_format.name());

    let (decoded, image) = decode_image(stream_format, &stream)?;
    let Header { width, height, .. } = decoded.header;

    // jpeg has no alpha channel
    let image = match format {
        ImageKind::Jpg => DynamicImage::ImageRgb8(image.into_rgb8()),
        _ => image,
    };

    image.save_with_format(&output, format.image_format())?;

    println!("Written {width}x{height} image to `{output}`");

    Ok(())
}

/// Decodes `stream` into an image. A truncated stream still yields an image of the declared size,
/// the missing pixels being zero.
fn decode_image(
    format: Format,
    stream: &[u8],
) -> Result<(Decoded, DynamicImage), Box<dyn std::error::Error>> {
    let (decoded, samples) = QoiDecodeContext::decode_to_vec(format, stream)?;
    let Header { width, height, .. } = decoded.header;

    match decoded.status {
        DecodeStatus::Complete => info!("decoded {} pixels", decoded.pixels),
        _ => warn!(
            "stream is truncated, only {} of {} pixels decoded",
            decoded.pixels,
            decoded.header.pixel_count()
        ),
    }

    let image = if decoded.header.channels.has_alpha() {
        DynamicImage::ImageRgba8(
            RgbaImage::from_vec(width, height, samples).ok_or("failed to create image")?,
        )
    } else {
        DynamicImage::ImageRgb8(
            RgbImage::from_vec(width, height, samples).ok_or("failed to create image")?,
        )
    };

    Ok((decoded, image))
}

fn print_info(options: Info) -> Result<(), Box<dyn std::error::Error>> {
    let Info { input } = options;

    let stream = std::fs::read(&input)?;
    let format = Format::detect(&stream).ok_or("not a QOI or QOI2 file")?;
    let header = Header::read(&format, &stream[..])?;

    println!("`{input}`: {}", format.name());
    println!("  dimensions:  {}x{}", header.width, header.height);
    println!("  channels:    {}", header.channels.count());
    println!("  color space: {:?}", header.color_space);
    println!(
        "  compression: {} bytes, {:.1}% of raw",
        stream.len(),
        stream.len() as f64 * 100.0 / (header.pixel_count() * header.channels.count()) as f64
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_stream_keeps_decoded_pixels() {
        let data = [10u8, 20, 30, 200, 100, 50, 1, 2, 3, 4, 5, 6];
        let source = PixelSource::from_bytes(2, 2, PixelLayout::RGB, &data).unwrap();
        let encoded = QoiEncodeContext::encode_to_vec(Format::QOI, &source).unwrap();

        // drop the closing LUMA opcode
        let (decoded, image) = decode_image(Format::QOI, &encoded[..encoded.len() - 2]).unwrap();
        assert_eq!(decoded.status, DecodeStatus::Truncated);
        assert_eq!(decoded.pixels, 3);

        let image = image.into_rgb8();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(&image.as_raw()[..9], &data[..9]);
        assert_eq!(&image.as_raw()[9..], [0, 0, 0]);
    }
}
