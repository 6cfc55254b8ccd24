use std::io::Cursor;

use super::*;
use crate::assets::source::MemoryAssetSource;

fn png_1x1(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(1, 1, rgba.to_vec()).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let prepared = decode_image(&png_1x1([100, 50, 200, 128])).unwrap();
    assert_eq!((prepared.width, prepared.height), (1, 1));
    assert_eq!(
        prepared.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn parse_svg_ok_and_err() {
    let ok = br#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2"></svg>"#;
    let svg = parse_svg(ok).unwrap();
    let size = svg.tree.size();
    assert_eq!((size.width(), size.height()), (4.0, 2.0));

    assert!(parse_svg(br#"<svg"#).is_err());
}

#[test]
fn load_image_dispatches_on_reference_kind() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20"></svg>"#;
    let source = MemoryAssetSource::new()
        .with("parts/a.svg", svg)
        .unwrap()
        .with("parts/b.png", png_1x1([0, 0, 0, 255]))
        .unwrap();

    let a = load_image(&ImageRef::path("/parts/a.svg"), &source).unwrap();
    assert!(matches!(a, LoadedImage::Svg(_)));
    assert_eq!(a.size(), (10.0, 20.0));

    let b = load_image(&ImageRef::path("parts/b.png"), &source).unwrap();
    assert!(matches!(b, LoadedImage::Raster(_)));
    assert_eq!(b.size(), (1.0, 1.0));

    let inline = load_image(&ImageRef::Svg(svg.into()), &source).unwrap();
    assert_eq!(inline.size(), (10.0, 20.0));

    assert!(load_image(&ImageRef::path("parts/missing.svg"), &source).is_err());
}
