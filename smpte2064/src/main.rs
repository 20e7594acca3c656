use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;

use smpte2064::{AudioType, Colorspace, Context};

/// Fixed sample count per audio window, matching the reference driver.
const AUDIO_SAMPLES_PER_FRAME: usize = 800;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Reads consecutive YUV420P video frames and interleaved stereo PCM audio from disk, printing one hex-encoded SMPTE ST 2064-1 container per frame.")]
struct Cli {
    /// Planar 8-bit YUV420P video file.
    #[clap(short = 'i', long, value_parser = clap::value_parser!(PathBuf))]
    video: PathBuf,

    /// Interleaved 32-bit stereo PCM audio file (L, R, L, R, ...).
    #[clap(short = 'I', long, value_parser = clap::value_parser!(PathBuf))]
    audio: Option<PathBuf>,

    /// Frame width in pixels.
    #[clap(short = 'W', long)]
    width: u32,

    /// Frame height in pixels.
    #[clap(short = 'H', long)]
    height: u32,

    /// Increase diagnostic verbosity. May be repeated.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn read_exact_or_eof(file: &mut File, buf: &mut [u8]) -> std::io::Result<bool> {
    match file.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

fn main() -> smpte2064::Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let args = Cli::parse();

    let mut ctx = Context::alloc(Colorspace::Yuv420p, true, args.width, args.height, 8)?;
    ctx.set_verbose(args.verbose);

    let frame_size = (args.width as usize) * (args.height as usize) * 3 / 2;
    let luma_size = (args.width as usize) * (args.height as usize);

    let mut video_file = File::open(&args.video).map_err(|e| {
        smpte2064::Error::InvalidArgument(format!("opening {}: {e}", args.video.display()))
    })?;
    let mut audio_file = args
        .audio
        .as_ref()
        .map(|p| {
            File::open(p)
                .map_err(|e| smpte2064::Error::InvalidArgument(format!("opening {}: {e}", p.display())))
        })
        .transpose()?;

    let mut frame_buf = vec![0u8; frame_size];
    let audio_interleaved_size = 2 * std::mem::size_of::<i32>() * AUDIO_SAMPLES_PER_FRAME;
    let mut audio_buf = vec![0u8; audio_interleaved_size];
    let mut section = [0u8; 512];

    loop {
        if !read_exact_or_eof(&mut video_file, &mut frame_buf)
            .map_err(|e| smpte2064::Error::InvalidArgument(format!("reading video: {e}")))?
        {
            break;
        }
        ctx.video_push(&frame_buf[..luma_size])?;

        if let Some(audio_file) = audio_file.as_mut() {
            if !read_exact_or_eof(audio_file, &mut audio_buf)
                .map_err(|e| smpte2064::Error::InvalidArgument(format!("reading audio: {e}")))?
            {
                break;
            }
            let interleaved: Vec<i32> = audio_buf
                .chunks_exact(4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            let l: Vec<i32> = (0..AUDIO_SAMPLES_PER_FRAME)
                .map(|i| interleaved[i * 2] >> 16)
                .collect();
            let r: Vec<i32> = (0..AUDIO_SAMPLES_PER_FRAME)
                .map(|i| interleaved[i * 2 + 1] >> 16)
                .collect();
            ctx.audio_push(
                AudioType::StereoS16P,
                1001,
                60000,
                &[&l, &r],
                AUDIO_SAMPLES_PER_FRAME,
            )?;
        }

        match ctx.pack(&mut section) {
            Ok(used) => {
                let hex: String = section[..used].iter().map(|b| format!("{b:02x}")).collect();
                println!("{hex}");
            }
            Err(smpte2064::Error::NoData) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
