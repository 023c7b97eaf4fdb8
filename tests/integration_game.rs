//! Integration tests for the game service over local image files.
//!
//! These tests verify that:
//! 1. Comparing two files on disk yields a score and a tier
//! 2. Missing or unreadable files surface as fetch errors, never as a score
//!    (local paths are only read when the service allows them)
//! 3. Generation is refused cleanly when no generator is configured

use assert_fs::prelude::*;
use assert_fs::TempDir;
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};
use picture_match::core::game::GameService;
use picture_match::core::generator::Language;
use picture_match::core::scorer::ScoreTier;
use picture_match::error::{ErrorKind, FetchError, GameError};
use predicates::prelude::*;
use std::io::Cursor;

fn gray_image(width: u32, height: u32, value: u8, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageLuma8(ImageBuffer::from_pixel(width, height, Luma([value])));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format).unwrap();
    bytes.into_inner()
}

#[test]
fn compares_local_files() {
    // 1. Write a target and two candidates
    let temp = TempDir::new().unwrap();
    let target = temp.child("target.png");
    target.write_binary(&gray_image(512, 512, 128, ImageFormat::Png)).unwrap();
    let close = temp.child("close.png");
    close.write_binary(&gray_image(300, 200, 128, ImageFormat::Png)).unwrap();
    let far = temp.child("far.png");
    far.write_binary(&gray_image(64, 64, 0, ImageFormat::Png)).unwrap();

    // 2. Score both against the target
    let service = GameService::builder().local_files(true).build().unwrap();
    let target_path = target.path().to_string_lossy();

    let good = service
        .compare(&target_path, &close.path().to_string_lossy())
        .unwrap();
    let bad = service
        .compare(&target_path, &far.path().to_string_lossy())
        .unwrap();

    // 3. Verify scores and tiers
    assert_eq!(good.score, 100);
    assert_eq!(good.tier, ScoreTier::Great);
    assert_eq!(bad.score, 75);
    assert_eq!(bad.tier, ScoreTier::Good);

    temp.close().unwrap();
}

#[test]
fn missing_file_is_a_fetch_error() {
    let temp = TempDir::new().unwrap();
    let target = temp.child("target.png");
    target.write_binary(&gray_image(32, 32, 10, ImageFormat::Png)).unwrap();
    let missing = temp.child("missing.png");

    let service = GameService::builder().local_files(true).build().unwrap();
    let err = service
        .compare(
            &target.path().to_string_lossy(),
            &missing.path().to_string_lossy(),
        )
        .unwrap_err();

    assert!(matches!(err, GameError::Fetch(FetchError::Io { .. })));
    assert_eq!(err.kind(), ErrorKind::Fetch);
    assert!(predicate::str::contains("missing.png").eval(&err.to_string()));
}

#[test]
fn non_image_file_is_a_decode_error() {
    let temp = TempDir::new().unwrap();
    let target = temp.child("target.png");
    target.write_binary(&gray_image(32, 32, 10, ImageFormat::Png)).unwrap();
    let notes = temp.child("notes.txt");
    notes.write_str("definitely not pixels").unwrap();

    let service = GameService::builder().local_files(true).build().unwrap();
    let err = service
        .compare(
            &target.path().to_string_lossy(),
            &notes.path().to_string_lossy(),
        )
        .unwrap_err();

    assert!(matches!(err, GameError::Score(_)));
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(predicate::str::contains("candidate").eval(&err.to_string()));
}

#[test]
fn local_files_are_refused_unless_enabled() {
    let temp = TempDir::new().unwrap();
    let target = temp.child("target.png");
    target.write_binary(&gray_image(32, 32, 10, ImageFormat::Png)).unwrap();
    let path = target.path().to_string_lossy();

    let service = GameService::builder().build().unwrap();
    let err = service.compare(&path, &path).unwrap_err();

    assert!(matches!(err, GameError::InvalidRequest(_)));
    assert_eq!(err.kind().status_code(), 400);
    assert!(predicate::str::contains("target.png").not().eval(&err.to_string()));
}

#[test]
fn blank_locator_is_an_invalid_request() {
    let service = GameService::builder().build().unwrap();
    let err = service.compare("   ", "/tmp/whatever.png").unwrap_err();

    assert!(matches!(err, GameError::InvalidRequest(_)));
    assert_eq!(err.kind().status_code(), 400);
}

#[test]
fn generation_without_generator_is_refused() {
    let service = GameService::builder().build().unwrap();
    assert!(!service.can_generate());

    let err = service.new_round(Language::En).unwrap_err();
    assert!(predicate::str::contains("OPENAI_API_KEY").eval(&err.to_string()));

    let err = service.generate("A red bicycle").unwrap_err();
    assert!(matches!(err, GameError::Config(_)));
}
