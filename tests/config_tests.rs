use std::path::PathBuf;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use pizza_timer::config::{Configuration, ImageSelection, RuntimeOverrides};
use pizza_timer::timing::{ChangePolicy, InitialImage};
use tempfile::tempdir;

fn parse(yaml: &str) -> Configuration {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn empty_document_uses_defaults() {
    let cfg = parse("{}");
    assert_eq!(cfg.total_duration, Duration::from_secs(12_600));
    assert_eq!(cfg.slice_duration, Duration::from_secs(1800));
    assert_eq!(cfg.canvas_size, 800);
    assert_eq!(cfg.pizza_radius, 300);
    assert_eq!(cfg.image_change_policy, ChangePolicy::Random);
    assert_eq!(cfg.initial_image, InitialImage::Index(0));
    assert_eq!(
        cfg.images,
        ImageSelection::Listed(vec![PathBuf::from("000_default.png")])
    );
    assert!(cfg.validated().is_ok());
}

#[test]
fn parse_kebab_case_keys_and_humantime_durations() {
    let yaml = r#"
total-duration: 2h
slice-duration: 15m
start-remaining: 1h 10m
image-change-interval: 30m
image-change-policy: cycle
pizza-radius: 250
canvas-size: 600
frame-rate: 10
fullscreen: true
"#;
    let cfg = parse(yaml).validated().unwrap();
    assert_eq!(cfg.total_duration, Duration::from_secs(7200));
    assert_eq!(cfg.slice_duration, Duration::from_secs(900));
    assert_eq!(cfg.start_remaining, Some(Duration::from_secs(4200)));
    assert_eq!(cfg.image_change_interval, Some(Duration::from_secs(1800)));
    assert_eq!(cfg.image_change_policy, ChangePolicy::Cycle);
    assert_eq!(cfg.frame_interval(), Duration::from_millis(100));
    assert!(cfg.fullscreen);
}

#[test]
fn change_policy_is_case_insensitive() {
    let cfg = parse("image-change-policy: Cycle");
    assert_eq!(cfg.image_change_policy, ChangePolicy::Cycle);
    let cfg = parse("image-change-policy: RANDOM");
    assert_eq!(cfg.image_change_policy, ChangePolicy::Random);
    assert!(serde_yaml::from_str::<Configuration>("image-change-policy: shuffle").is_err());
}

#[test]
fn images_accept_all_single_and_list() {
    assert_eq!(parse("images: all").images, ImageSelection::All);
    assert_eq!(parse("images: ALL").images, ImageSelection::All);
    assert_eq!(
        parse("images: margherita.png").images,
        ImageSelection::Listed(vec![PathBuf::from("margherita.png")])
    );
    assert_eq!(
        parse("images: [a.png, b.jpg]").images,
        ImageSelection::Listed(vec![PathBuf::from("a.png"), PathBuf::from("b.jpg")])
    );
}

#[test]
fn initial_image_accepts_index_random_and_null() {
    assert_eq!(parse("initial-image: 2").initial_image, InitialImage::Index(2));
    assert_eq!(parse("initial-image: random").initial_image, InitialImage::Random);
    assert_eq!(parse("initial-image: none").initial_image, InitialImage::Random);
    assert_eq!(parse("initial-image: ~").initial_image, InitialImage::Random);
    assert!(serde_yaml::from_str::<Configuration>("initial-image: -1").is_err());
    assert!(serde_yaml::from_str::<Configuration>("initial-image: first").is_err());
}

#[test]
fn unknown_keys_are_rejected() {
    let err = serde_yaml::from_str::<Configuration>("pizza-topping: pineapple").unwrap_err();
    assert!(err.to_string().contains("pizza-topping"));
}

#[test]
fn validation_rejects_bad_values() {
    let cases = [
        "total-duration: 0s",
        "slice-duration: 0s",
        "total-duration: 1h\nslice-duration: 2h",
        "image-change-interval: 5h",
        "total-duration: 1h\nstart-remaining: 2h",
        "images: []",
        "pizza-radius: 401",
        "canvas-size: 0",
        "font-size: 0",
        "line-width: -1",
        "separator-gap-length: -2",
        "frame-rate: 0",
    ];
    for yaml in cases {
        assert!(parse(yaml).validated().is_err(), "expected {yaml:?} to fail");
    }
}

#[test]
fn timer_config_applies_runtime_overrides() {
    let yaml = r#"
total-duration: 1h
slice-duration: 10m
start-remaining: 50m
seed: 3
images: [a.png, b.png, c.png]
initial-image: 1
"#;
    let cfg = parse(yaml).validated().unwrap();

    let timer = cfg.timer_config(RuntimeOverrides::default()).unwrap();
    assert!((timer.start_remaining() - 3000.0).abs() < 1e-9);
    assert!((timer.image_change_interval() - 600.0).abs() < 1e-9);
    assert_eq!(timer.seed(), Some(3));
    assert_eq!(timer.initial_image(), InitialImage::Index(1));
    assert_eq!(timer.image_list().len(), 3);

    let timer = cfg
        .timer_config(RuntimeOverrides {
            seed: Some(42),
            start_remaining: Some(Duration::from_secs(600)),
        })
        .unwrap();
    assert_eq!(timer.seed(), Some(42));
    assert!((timer.start_remaining() - 600.0).abs() < 1e-9);
}

#[test]
fn out_of_range_initial_image_fails_timer_config() {
    let cfg = parse("images: [a.png]\ninitial-image: 3").validated().unwrap();
    assert!(cfg.timer_config(RuntimeOverrides::default()).is_err());
}

#[test]
fn images_all_lists_image_root_sorted() {
    let dir = tempdir().unwrap();
    for name in ["b.png", "a.png"] {
        RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]))
            .save(dir.path().join(name))
            .unwrap();
    }
    std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

    let yaml = format!("images: all\nimage-root: {:?}", dir.path().display().to_string());
    let cfg = parse(&yaml).validated().unwrap();
    assert_eq!(
        cfg.resolve_images().unwrap(),
        vec![PathBuf::from("a.png"), PathBuf::from("b.png")]
    );
}

#[test]
fn images_all_in_empty_root_is_an_error() {
    let dir = tempdir().unwrap();
    let yaml = format!("images: all\nimage-root: {:?}", dir.path().display().to_string());
    let cfg = parse(&yaml).validated().unwrap();
    assert!(cfg.resolve_images().is_err());
    assert!(cfg.timer_config(RuntimeOverrides::default()).is_err());
}

#[test]
fn mask_color_defaults_to_background() {
    let cfg = parse("background-color: [1, 2, 3, 255]");
    assert_eq!(cfg.canvas_style().mask_color, [1, 2, 3, 255]);

    let cfg = parse("background-color: [1, 2, 3, 255]\nmask-color: [9, 9, 9, 255]");
    assert_eq!(cfg.canvas_style().mask_color, [9, 9, 9, 255]);
    assert_eq!(cfg.canvas_style().background_color, [1, 2, 3, 255]);
}

#[test]
fn absurd_section_count_fails_timer_config() {
    let cfg = parse("total-duration: 1h\nslice-duration: 1s").validated().unwrap();
    assert!(cfg.timer_config(RuntimeOverrides::default()).is_err());
    let cfg = parse("total-duration: 1h\nslice-duration: 10s").validated().unwrap();
    assert!(cfg.timer_config(RuntimeOverrides::default()).is_ok());
}
