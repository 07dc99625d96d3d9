extern crate image;
extern crate imageproc;
extern crate std;

use crate::config::Viewport;
use crate::render;
use crate::result;

pub struct Styles {
    pub color_background: image::Rgb<u8>,
    pub color_grid: image::Rgb<u8>,
    pub color_outline: image::Rgb<u8>,
    pub color_accessible: image::Rgb<u8>,
    pub color_vehicle: image::Rgb<u8>,
    pub marker_radius: i32,
}

impl Default for Styles {
    fn default() -> Styles {
        return Styles{
            color_background: image::Rgb([242u8, 239u8, 233u8]),
            color_grid: image::Rgb([220u8, 216u8, 208u8]),
            color_outline: image::Rgb([33u8, 37u8, 41u8]),
            color_accessible: image::Rgb([25u8, 135u8, 84u8]),
            color_vehicle: image::Rgb([13u8, 110u8, 253u8]),
            marker_radius: 8,
        };
    }
}

const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.05112878;

/// Web-Mercator "world pixel" coordinates of (lat, lon) at `zoom`.
pub fn world_pixel(lat: f64, lon: f64, zoom: u32) -> (f64, f64) {
    let size = TILE_SIZE * 2f64.powi(zoom as i32);
    let lat = lat.max(-MAX_LATITUDE).min(MAX_LATITUDE);
    let sin = lat.to_radians().sin();

    let x = (lon + 180.0) / 360.0 * size;
    let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * std::f64::consts::PI)) * size;
    return (x, y);
}

/// Canvas position of (lat, lon), with the viewport center in the middle.
pub fn to_canvas(lat: f64, lon: f64, viewport: &Viewport) -> (f64, f64) {
    let (x, y) = world_pixel(lat, lon, viewport.zoom);
    let (cx, cy) = world_pixel(viewport.center_lat, viewport.center_lon, viewport.zoom);
    return (x - cx + viewport.width as f64 / 2.0,
            y - cy + viewport.height as f64 / 2.0);
}

pub fn generate_image(markers: &[render::Marker], viewport: &Viewport, styles: &Styles) -> image::RgbImage {
    let mut imgbuf = image::RgbImage::new(viewport.width, viewport.height);

    imageproc::drawing::draw_filled_rect_mut(
        &mut imgbuf,
        imageproc::rect::Rect::at(0, 0).of_size(viewport.width, viewport.height),
        styles.color_background);
    draw_tile_grid(&mut imgbuf, viewport, styles);

    let mut drawn = 0;
    for marker in markers {
        if draw_marker(&mut imgbuf, viewport, styles, marker) {
            drawn = drawn + 1;
        }
    }
    debug!("Drew {} of {} markers", drawn, markers.len());

    return imgbuf;
}

// Stand-in for the base map: the tile boundaries at the current zoom.
fn draw_tile_grid(imgbuf: &mut image::RgbImage, viewport: &Viewport, styles: &Styles) {
    let (cx, cy) = world_pixel(viewport.center_lat, viewport.center_lon, viewport.zoom);
    let left = cx - viewport.width as f64 / 2.0;
    let top = cy - viewport.height as f64 / 2.0;

    let mut x = (left / TILE_SIZE).ceil() * TILE_SIZE - left;
    while x < viewport.width as f64 {
        imageproc::drawing::draw_line_segment_mut(
            imgbuf, (x as f32, 0.0), (x as f32, viewport.height as f32), styles.color_grid);
        x = x + TILE_SIZE;
    }

    let mut y = (top / TILE_SIZE).ceil() * TILE_SIZE - top;
    while y < viewport.height as f64 {
        imageproc::drawing::draw_line_segment_mut(
            imgbuf, (0.0, y as f32), (viewport.width as f32, y as f32), styles.color_grid);
        y = y + TILE_SIZE;
    }
}

fn draw_marker(imgbuf: &mut image::RgbImage, viewport: &Viewport, styles: &Styles, marker: &render::Marker) -> bool {
    let (x, y) = to_canvas(marker.lat, marker.lon, viewport);
    let r = styles.marker_radius as f64;
    if x < -r || y < -r || x > viewport.width as f64 + r || y > viewport.height as f64 + r {
        return false;
    }

    let fill = match marker.popup.accessibility.style {
        render::BadgeStyle::Success => styles.color_accessible,
        _ => styles.color_vehicle,
    };

    let center = (x.round() as i32, y.round() as i32);
    imageproc::drawing::draw_filled_circle_mut(imgbuf, center, styles.marker_radius, styles.color_outline);
    imageproc::drawing::draw_filled_circle_mut(imgbuf, center, styles.marker_radius - 2, fill);
    return true;
}

pub fn encode_png(imgbuf: &image::RgbImage) -> result::SeguiResult<Vec<u8>> {
    let mut bytes = std::io::Cursor::new(vec![]);
    imgbuf.write_to(&mut bytes, image::ImageFormat::Png)?;
    return Ok(bytes.into_inner());
}

#[cfg(test)]
mod tests {
    use crate::config::Viewport;
    use crate::render;
    use crate::vehicle;

    fn near(expected: f64, actual: f64) -> bool {
        return (expected - actual).abs() < 1e-6;
    }

    #[test]
    fn world_origin_at_zoom_zero() {
        let (x, y) = super::world_pixel(0.0, 0.0, 0);
        assert!(near(128.0, x));
        assert!(near(128.0, y));
    }

    #[test]
    fn center_maps_to_canvas_middle() {
        let viewport = Viewport::default();
        let (x, y) = super::to_canvas(viewport.center_lat, viewport.center_lon, &viewport);
        assert!(near(400.0, x));
        assert!(near(300.0, y));
    }

    #[test]
    fn north_is_up_and_east_is_right() {
        let viewport = Viewport::default();
        let (x_east, _) = super::to_canvas(viewport.center_lat, viewport.center_lon + 0.01, &viewport);
        let (_, y_north) = super::to_canvas(viewport.center_lat + 0.01, viewport.center_lon, &viewport);
        assert!(x_east > 400.0);
        assert!(y_north < 300.0);
    }

    #[test]
    fn marker_is_drawn_at_its_position() {
        let viewport = Viewport::default();
        let styles = super::Styles::default();
        let markers = render::project(&[vehicle::Vehicle{
            lat: viewport.center_lat,
            lon: viewport.center_lon,
            accessible: true,
            ..vehicle::Vehicle::default()
        }]);

        let imgbuf = super::generate_image(&markers, &viewport, &styles);

        assert_eq!((800, 600), imgbuf.dimensions());
        assert_eq!(&styles.color_accessible, imgbuf.get_pixel(400, 300));
        assert_eq!(&styles.color_background, imgbuf.get_pixel(10, 10));
    }

    #[test]
    fn offscreen_markers_are_skipped() {
        let viewport = Viewport::default();
        let styles = super::Styles::default();
        let markers = render::project(&[vehicle::Vehicle{
            lat: 41.9,
            lon: 12.5,
            ..vehicle::Vehicle::default()
        }]);

        let imgbuf = super::generate_image(&markers, &viewport, &styles);
        let empty = super::generate_image(&[], &viewport, &styles);

        assert!(imgbuf.pixels().eq(empty.pixels()));
    }

    #[test]
    fn png_has_magic_bytes() {
        let imgbuf = super::generate_image(&[], &Viewport::default(), &super::Styles::default());
        let png = super::encode_png(&imgbuf).expect("encode_png");
        assert_eq!(&[0x89u8, b'P', b'N', b'G'], &png[0..4]);
    }
}
