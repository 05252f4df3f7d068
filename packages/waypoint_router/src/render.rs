//! Draws a finished route over the road network and encodes the result as a
//! base64 PNG, ready to be embedded in a JSON response.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::common::bbox::BBox;
use crate::common::error::RenderError;
use crate::loading::petgraph::GraphStore;
use crate::routing::strategy::RouteStrategy;

const BACKGROUND: [u8; 3] = [255, 255, 255];
const ROAD: [u8; 3] = [200, 200, 200];
const GREEDY_ROUTE: [u8; 3] = [255, 140, 0];
const EXACT_ROUTE: [u8; 3] = [34, 139, 34];

/// Fraction of the viewport left empty on each side
const MARGIN: f64 = 0.05;

/// The colour a route is drawn in, which depends on how it was computed
pub fn route_colour(strategy: RouteStrategy) -> [u8; 3] {
    match strategy {
        RouteStrategy::GreedyStitch => GREEDY_ROUTE,
        RouteStrategy::ExactFlowOptimization => EXACT_ROUTE,
    }
}

/// An RGB pixel buffer, with a projection from lat/lon onto pixel
/// coordinates
struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    viewport: BBox,
}

impl Canvas {
    fn new(
        width: u32,
        height: u32,
        bbox: BBox,
    ) -> Result<Canvas, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyViewport { width, height });
        }

        let lat_pad = ((bbox.max_lat - bbox.min_lat) * MARGIN).max(1e-4);
        let lon_pad = ((bbox.max_lon - bbox.min_lon) * MARGIN).max(1e-4);
        let viewport = BBox {
            min_lat: bbox.min_lat - lat_pad,
            min_lon: bbox.min_lon - lon_pad,
            max_lat: bbox.max_lat + lat_pad,
            max_lon: bbox.max_lon + lon_pad,
        };

        let size = width as usize * height as usize * 3;
        let pixels = BACKGROUND.iter().copied().cycle().take(size).collect();

        Ok(Canvas {
            width,
            height,
            pixels,
            viewport,
        })
    }

    /// Equirectangular projection of the viewport onto the canvas. North is
    /// up
    fn project(&self, lat: f64, lon: f64) -> (i64, i64) {
        let vp = &self.viewport;
        let fx = (lon - vp.min_lon) / (vp.max_lon - vp.min_lon);
        let fy = (vp.max_lat - lat) / (vp.max_lat - vp.min_lat);
        let x = (fx * (self.width - 1) as f64).round() as i64;
        let y = (fy * (self.height - 1) as f64).round() as i64;
        (x, y)
    }

    fn set(&mut self, x: i64, y: i64, colour: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64
        {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels[offset..offset + 3].copy_from_slice(&colour);
    }

    /// Draw a line using Bresenham's algorithm. A non-zero radius stamps a
    /// square of that half-width at every step
    fn line(
        &mut self,
        from: (f64, f64),
        to: (f64, f64),
        colour: [u8; 3],
        radius: i64,
    ) {
        let (x0, y0) = self.project(from.0, from.1);
        let (x1, y1) = self.project(to.0, to.1);

        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;

        let (mut x, mut y) = (x0, y0);
        loop {
            for ox in -radius..=radius {
                for oy in -radius..=radius {
                    self.set(x + ox, y + oy, colour);
                }
            }

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn encode(self) -> Result<Vec<u8>, RenderError> {
        let mut buf = Vec::<u8>::new();
        {
            let mut encoder =
                png::Encoder::new(&mut buf, self.width, self.height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
            writer.finish()?;
        }
        Ok(buf)
    }
}

/// Draw every road in grey, then the route over the top, returning the raw
/// PNG bytes
pub fn render_png(
    store: &GraphStore,
    coordinates: &[(f64, f64)],
    colour: [u8; 3],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, RenderError> {
    let fallback = coordinates.first().copied().unwrap_or((0.0, 0.0));
    let bbox = store.bbox().unwrap_or(BBox {
        min_lat: fallback.0,
        min_lon: fallback.1,
        max_lat: fallback.0,
        max_lon: fallback.1,
    });

    let mut canvas = Canvas::new(width, height, bbox)?;

    for edge in store.all_arcs() {
        let ends = (store.node(edge.src), store.node(edge.dst));
        if let (Ok(src), Ok(dst)) = ends {
            canvas.line((src.lat, src.lon), (dst.lat, dst.lon), ROAD, 0);
        }
    }

    match coordinates {
        [only] => canvas.line(*only, *only, colour, 2),
        _ => {
            for pair in coordinates.windows(2) {
                canvas.line(pair[0], pair[1], colour, 1);
            }
        }
    }

    canvas.encode()
}

/// Render the route and encode the PNG as base64 text
pub fn render_base64(
    store: &GraphStore,
    coordinates: &[(f64, f64)],
    strategy: RouteStrategy,
    width: u32,
    height: u32,
) -> Result<String, RenderError> {
    let colour = route_colour(strategy);
    let png = render_png(store, coordinates, colour, width, height)?;
    Ok(STANDARD.encode(png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::test_utils::bogota_store;

    const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    /// Decode a PNG back to its dimensions and pixel data
    fn decode(bytes: &[u8]) -> (u32, u32, Vec<u8>) {
        let decoder = png::Decoder::new(bytes);
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info.width, info.height, buf)
    }

    /// A rendered route is a valid PNG of the requested size
    #[test]
    fn test_render_png() {
        let store = bogota_store();
        let coords = vec![(4.65, -74.10), (4.675, -74.075), (4.70, -74.05)];

        let result =
            render_png(&store, &coords, GREEDY_ROUTE, 64, 48).unwrap();

        assert_eq!(result[..8], PNG_SIGNATURE);
        let (width, height, pixels) = decode(&result);
        assert_eq!((width, height), (64, 48));
        assert!(pixels.chunks(3).any(|px| px == GREEDY_ROUTE));
        assert!(pixels.chunks(3).any(|px| px == ROAD));
    }

    /// Each strategy draws the route in its own colour
    #[test]
    fn test_route_colour() {
        let store = bogota_store();
        let coords = vec![(4.65, -74.10), (4.70, -74.05)];

        let exact = render_png(
            &store,
            &coords,
            route_colour(RouteStrategy::ExactFlowOptimization),
            32,
            32,
        )
        .unwrap();

        let (_, _, pixels) = decode(&exact);
        assert!(pixels.chunks(3).any(|px| px == EXACT_ROUTE));
        assert!(!pixels.chunks(3).any(|px| px == GREEDY_ROUTE));
    }

    /// The base64 output decodes back to a PNG
    #[test]
    fn test_render_base64() {
        let store = bogota_store();
        let coords = vec![(4.65, -74.10)];

        let result = render_base64(
            &store,
            &coords,
            RouteStrategy::GreedyStitch,
            16,
            16,
        )
        .unwrap();

        let bytes = STANDARD.decode(result).unwrap();
        assert_eq!(bytes[..8], PNG_SIGNATURE);
    }

    /// Zero-sized images are rejected before any drawing happens
    #[test]
    fn test_render_empty_viewport() {
        let store = bogota_store();

        let result = render_png(&store, &[], GREEDY_ROUTE, 0, 10);

        assert!(matches!(
            result,
            Err(RenderError::EmptyViewport {
                width: 0,
                height: 10
            })
        ));
    }
}
