use crate::agent::Point;
use crate::color::blend;
use anyhow::Result;
use image::{Rgb, RgbImage};
use std::path::Path;

/// Software framebuffer standing in for the simulation window.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, background),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn fill(&mut self, color: Rgb<u8>) {
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }

    pub fn pixel(&self, x: i64, y: i64) -> Option<Rgb<u8>> {
        self.in_bounds(x, y)
            .then(|| *self.image.get_pixel(x as u32, y as u32))
    }

    fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }

    /// Writes one pixel, blended with what is underneath when `alpha < 1`.
    /// Off-canvas coordinates are ignored.
    pub fn put(&mut self, x: i64, y: i64, color: Rgb<u8>, alpha: f64) {
        if !self.in_bounds(x, y) {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        *pixel = if alpha >= 1.0 { color } else { blend(*pixel, color, alpha) };
    }

    pub fn fill_circle(&mut self, center: Point, radius: f64, color: Rgb<u8>, alpha: f64) {
        let r2 = radius * radius;
        let x0 = (center.x - radius).floor() as i64;
        let x1 = (center.x + radius).ceil() as i64;
        let y0 = (center.y - radius).floor() as i64;
        let y1 = (center.y + radius).ceil() as i64;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - center.x;
                let dy = y as f64 + 0.5 - center.y;
                if dx * dx + dy * dy <= r2 {
                    self.put(x, y, color, alpha);
                }
            }
        }
    }

    /// Straight line of the given pixel width.
    pub fn draw_line(&mut self, from: Point, to: Point, color: Rgb<u8>, width: u32) {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;

        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let p = Point::new(from.x + t * dx, from.y + t * dy);
            if width <= 1 {
                self.put(p.x.floor() as i64, p.y.floor() as i64, color, 1.0);
            } else {
                self.fill_circle(p, width as f64 / 2.0, color, 1.0);
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save(path.as_ref())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BACKGROUND, BLACK, BLUE, WHITE};

    #[test]
    fn circle_covers_its_centre_only() {
        let mut canvas = Canvas::new(40, 40, BACKGROUND);
        canvas.fill_circle(Point::new(20.0, 20.0), 5.0, BLUE, 1.0);
        assert_eq!(canvas.pixel(20, 20), Some(BLUE));
        assert_eq!(canvas.pixel(20, 16), Some(BLUE));
        assert_eq!(canvas.pixel(20, 27), Some(BACKGROUND));
        assert_eq!(canvas.pixel(2, 2), Some(BACKGROUND));
    }

    #[test]
    fn horizontal_line_is_drawn_end_to_end() {
        let mut canvas = Canvas::new(20, 10, WHITE);
        canvas.draw_line(Point::new(2.0, 5.0), Point::new(17.0, 5.0), BLACK, 1);
        for x in 2..=17 {
            assert_eq!(canvas.pixel(x, 5), Some(BLACK), "x = {}", x);
        }
        assert_eq!(canvas.pixel(1, 5), Some(WHITE));
        assert_eq!(canvas.pixel(18, 5), Some(WHITE));
    }

    #[test]
    fn off_canvas_drawing_is_clipped() {
        let mut canvas = Canvas::new(10, 10, WHITE);
        canvas.fill_circle(Point::new(-3.0, -3.0), 5.0, BLACK, 1.0);
        canvas.put(100, 100, BLACK, 1.0);
        assert_eq!(canvas.pixel(0, 0), Some(BLACK));
        assert_eq!(canvas.pixel(9, 9), Some(WHITE));
        assert_eq!(canvas.pixel(-1, 0), None);
    }

    #[test]
    fn translucent_put_blends() {
        let mut canvas = Canvas::new(1, 1, BLACK);
        canvas.put(0, 0, WHITE, 0.5);
        assert_eq!(canvas.pixel(0, 0), Some(Rgb([128, 128, 128])));
    }
}
