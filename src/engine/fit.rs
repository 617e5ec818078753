use crate::types::DrawRect;

/// Contain-fit an image inside a viewport, centered on the slack axis.
pub fn contain(image_width: f64, image_height: f64, view_width: f64, view_height: f64) -> DrawRect {
    let empty = DrawRect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };
    if !(image_width > 0.0 && image_height > 0.0 && view_width > 0.0 && view_height > 0.0) {
        return empty;
    }

    let image_ratio = image_width / image_height;
    let view_ratio = view_width / view_height;

    if image_ratio > view_ratio {
        // Wider than the viewport: letterbox.
        let height = view_width / image_ratio;
        DrawRect {
            x: 0.0,
            y: (view_height - height) / 2.0,
            width: view_width,
            height,
        }
    } else {
        // Taller or equal: pillarbox.
        let width = view_height * image_ratio;
        DrawRect {
            x: (view_width - width) / 2.0,
            y: 0.0,
            width,
            height: view_height,
        }
    }
}
