use super::*;
use crate::foundation::core::Fps;

fn frame(w: u32, h: u32, px: [u8; 4], premultiplied: bool) -> FrameRGBA {
    FrameRGBA {
        width: w,
        height: h,
        data: px.repeat((w * h) as usize),
        premultiplied,
    }
}

fn sink_cfg(w: u32, h: u32) -> SinkConfig {
    SinkConfig {
        width: w,
        height: h,
        fps: Fps::new(30000, 1001).unwrap(),
    }
}

#[test]
fn transparent_pixel_shows_the_background() {
    let mut out = Vec::new();
    composite_rgb(&frame(1, 1, [0, 0, 0, 0], true), Rgba8::rgb(10, 20, 30), &mut out).unwrap();
    assert_eq!(out, vec![10, 20, 30]);
}

#[test]
fn opaque_pixels_drop_their_alpha() {
    let mut out = vec![9; 100];
    composite_rgb(&frame(2, 1, [1, 2, 3, 255], true), Rgba8::WHITE, &mut out).unwrap();
    assert_eq!(out, vec![1, 2, 3, 1, 2, 3]);
}

#[test]
fn straight_and_premultiplied_half_coverage_agree() {
    let mut premul = Vec::new();
    let mut straight = Vec::new();
    composite_rgb(&frame(1, 1, [128, 0, 0, 128], true), Rgba8::WHITE, &mut premul).unwrap();
    composite_rgb(&frame(1, 1, [255, 0, 0, 128], false), Rgba8::WHITE, &mut straight).unwrap();
    assert_eq!(premul, vec![255, 127, 127]);
    assert_eq!(straight, premul);
}

#[test]
fn short_buffer_is_rejected() {
    let mut bad = frame(2, 2, [0, 0, 0, 255], true);
    bad.data.truncate(12);
    assert!(composite_rgb(&bad, Rgba8::WHITE, &mut Vec::new()).is_err());
}

#[test]
fn encoder_reads_rgb24_at_the_sink_rate() {
    let opts = FfmpegSinkOpts {
        overwrite: false,
        crf: 28,
        ..FfmpegSinkOpts::new("out/run.mp4")
    };
    let args = encoder_args(&sink_cfg(640, 360), &opts);
    let after = |flag: &str| {
        let at = args.iter().position(|a| a == flag).unwrap();
        args[at + 1].clone()
    };
    assert_eq!(args[0], "-n");
    assert_eq!(after("-video_size"), "640x360");
    assert_eq!(after("-framerate"), "30000/1001");
    assert_eq!(after("-crf"), "28");
    assert_eq!(after("-f"), "rawvideo");
    let input = args.iter().position(|a| a == "-i").unwrap();
    let rate = args.iter().position(|a| a == "-framerate").unwrap();
    assert!(rate < input);
    assert!(args.iter().any(|a| a == "rgb24"));
    assert_eq!(args.last().map(String::as_str), Some("out/run.mp4"));
}

#[test]
fn options_follow_the_palette_background() {
    let mut cfg = VizConfig::default();
    cfg.palette.background = Rgba8::rgb(12, 12, 40);
    let opts = FfmpegSinkOpts::from_config("a.mp4", &cfg);
    assert_eq!(opts.background, Rgba8::rgb(12, 12, 40));
    assert!(opts.overwrite);
}

#[test]
fn odd_dimensions_are_rejected_before_spawning() {
    let dir = std::env::temp_dir().join(format!("treeflow-ffmpeg-{}", std::process::id()));
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(dir.join("out.mp4")));
    let err = sink.begin(sink_cfg(101, 100)).unwrap_err();
    assert!(err.to_string().contains("even canvas"));
    assert!(!dir.exists());
}

#[test]
fn push_before_begin_fails() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("unused.mp4"));
    let black = frame(2, 2, [0, 0, 0, 255], true);
    assert!(sink.push_frame(FrameIndex(0), &black).is_err());
    assert!(sink.end().is_err());
    assert_eq!(sink.written(), 0);
}
