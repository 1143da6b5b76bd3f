// Canvas2D painter for a composed Scene. Draw order is back to front; nothing
// here reads or writes world state.
use std::f64::consts::TAU;

use web_sys::CanvasRenderingContext2d;

use super::scene::{
    GROUND_TILE_W, HILL_SEGMENT_W, LANE_LINE_LENGTH, LANE_LINE_WIDTH, MOUNTAIN_SEGMENT_W, Scene,
};

pub fn paint(ctx: &CanvasRenderingContext2d, scene: &Scene) {
    draw_sky(ctx, scene);
    draw_mountains(ctx, scene);
    draw_hills(ctx, scene);
    draw_ground_strip(ctx, scene);
    draw_road(ctx, scene);
    draw_lane_lines(ctx, scene);
    draw_hearts(ctx, scene);
    draw_car(ctx, scene);
}

fn vertical_gradient(ctx: &CanvasRenderingContext2d, y0: f64, y1: f64, stops: &[(f32, &str)]) {
    let g = ctx.create_linear_gradient(0.0, y0, 0.0, y1);
    for (offset, color) in stops {
        g.add_color_stop(*offset, color).ok();
    }
    ctx.set_fill_style_canvas_gradient(&g);
}

fn draw_sky(ctx: &CanvasRenderingContext2d, s: &Scene) {
    vertical_gradient(
        ctx,
        0.0,
        s.height,
        &[
            (0.0, "#87CEEB"),
            (0.4, "#b8d4e8"),
            (0.7, "#e8d4c4"),
            (1.0, "#c9b8a8"),
        ],
    );
    ctx.fill_rect(0.0, 0.0, s.width, s.height);

    let o = s.cloud_offset;
    ctx.set_fill_style_str("rgba(255, 255, 255, 0.75)");
    draw_cloud(ctx, -o + 50.0, s.height * 0.18, 50.0);
    draw_cloud(ctx, -o + s.width * 0.4, s.height * 0.12, 40.0);
    draw_cloud(ctx, -o + s.width * 0.75, s.height * 0.22, 45.0);
    draw_cloud(ctx, -o + s.width + 100.0, s.height * 0.15, 38.0);
}

fn draw_cloud(ctx: &CanvasRenderingContext2d, x: f64, y: f64, size: f64) {
    ctx.begin_path();
    ctx.arc(x, y, size * 0.5, 0.0, TAU).ok();
    ctx.arc(x + size * 0.5, y - size * 0.1, size * 0.45, 0.0, TAU).ok();
    ctx.arc(x + size * 0.9, y, size * 0.5, 0.0, TAU).ok();
    ctx.fill();
}

/// Fill one closed ridge polygon per segment across the screen. `points` are
/// (dx, y) pairs relative to the segment origin; both ends drop to below the
/// bottom edge.
fn draw_ridge_layer(
    ctx: &CanvasRenderingContext2d,
    s: &Scene,
    seg_w: f64,
    shift: f64,
    start_dx: f64,
    points: &[(f64, f64)],
    end_dx: f64,
) {
    let bottom = s.height + 20.0;
    let count = (s.width / seg_w).ceil() as i32 + 1;
    for i in -1..=count {
        let x0 = i as f64 * seg_w + shift;
        ctx.begin_path();
        ctx.move_to(x0 + start_dx, bottom);
        for (dx, y) in points {
            ctx.line_to(x0 + dx, *y);
        }
        ctx.line_to(x0 + end_dx, bottom);
        ctx.close_path();
        ctx.fill();
    }
}

fn draw_mountains(ctx: &CanvasRenderingContext2d, s: &Scene) {
    let base = s.road_top + 30.0;
    let seg = MOUNTAIN_SEGMENT_W;
    let o = s.mountain_offset;

    // back range, darker
    ctx.set_fill_style_str("#8b9ba8");
    draw_ridge_layer(
        ctx,
        s,
        seg,
        -o,
        0.0,
        &[
            (120.0, base + 80.0),
            (280.0, base + 40.0),
            (400.0, base + 100.0),
            (550.0, base + 30.0),
        ],
        seg + 50.0,
    );

    ctx.set_fill_style_str("#9aaab8");
    draw_ridge_layer(
        ctx,
        s,
        seg,
        -o + 80.0,
        0.0,
        &[
            (100.0, base + 120.0),
            (220.0, base + 60.0),
            (380.0, base + 90.0),
            (500.0, base + 50.0),
        ],
        seg,
    );
}

fn draw_hills(ctx: &CanvasRenderingContext2d, s: &Scene) {
    let base = s.road_top + 10.0;
    let seg = HILL_SEGMENT_W;
    let o = s.hill_offset;

    ctx.set_fill_style_str("#a8c4a0");
    draw_ridge_layer(
        ctx,
        s,
        seg,
        -o,
        -20.0,
        &[(80.0, base + 60.0), (200.0, base + 25.0), (320.0, base + 55.0)],
        seg + 40.0,
    );

    ctx.set_fill_style_str("#b5d0ac");
    draw_ridge_layer(
        ctx,
        s,
        seg,
        -o + 150.0,
        0.0,
        &[(120.0, base + 45.0), (280.0, base + 70.0)],
        seg + 50.0,
    );
}

fn draw_ground_strip(ctx: &CanvasRenderingContext2d, s: &Scene) {
    let strip_h = 36.0;
    let strip_y = s.road_top - strip_h;
    let half = GROUND_TILE_W / 2.0;
    for (start, color) in [(0.0, "#b8a878"), (half, "#c9b896")] {
        ctx.set_fill_style_str(color);
        let mut x = -s.ground_offset + start;
        while x < s.width + GROUND_TILE_W {
            ctx.fill_rect(x, strip_y, half, strip_h);
            x += GROUND_TILE_W;
        }
    }
}

fn draw_road(ctx: &CanvasRenderingContext2d, s: &Scene) {
    ctx.set_fill_style_str("rgba(0, 0, 0, 0.06)");
    ctx.fill_rect(0.0, s.road_top - 2.0, s.width, s.road_height + 4.0);

    vertical_gradient(
        ctx,
        s.road_top,
        s.height,
        &[
            (0.0, "#7a8594"),
            (0.3, "#8b96a5"),
            (0.7, "#7a8594"),
            (1.0, "#6a7584"),
        ],
    );
    ctx.fill_rect(0.0, s.road_top, s.width, s.road_height);

    ctx.set_stroke_style_str("rgba(255, 255, 255, 0.95)");
    ctx.set_line_width(6.0);
    line(ctx, 0.0, s.road_top, s.width, s.road_top);
    line(ctx, 0.0, s.height, s.width, s.height);
}

fn draw_lane_lines(ctx: &CanvasRenderingContext2d, s: &Scene) {
    let cy = s.lane_center_y();
    ctx.set_stroke_style_str("#f5e6a8");
    ctx.set_line_width(LANE_LINE_WIDTH);
    ctx.set_line_cap("round");
    for &x in &s.lane_lines {
        line(ctx, x, cy - LANE_LINE_LENGTH / 2.0, x, cy + LANE_LINE_LENGTH / 2.0);
    }
}

fn draw_hearts(ctx: &CanvasRenderingContext2d, s: &Scene) {
    for &(hx, hy) in &s.hearts {
        ctx.save();
        ctx.translate(hx, hy).ok();
        ctx.scale(s.scale, s.scale).ok();
        ctx.set_font("14px serif");
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        ctx.set_fill_style_str("#ff6b9d");
        ctx.set_stroke_style_str("#e5558a");
        ctx.set_line_width(2.0);
        ctx.stroke_text("♥", 0.0, 0.0).ok();
        ctx.fill_text("♥", 0.0, 0.0).ok();
        ctx.restore();
    }
}

fn polygon(ctx: &CanvasRenderingContext2d, pts: &[(f64, f64)]) {
    ctx.begin_path();
    if let Some(&(x, y)) = pts.first() {
        ctx.move_to(x, y);
    }
    for &(x, y) in pts.iter().skip(1) {
        ctx.line_to(x, y);
    }
    ctx.close_path();
}

// Low wedge sports car in side view, nose pointing right. Sprite space is
// centered on the car and scaled by `Scene::scale`.
fn draw_car(ctx: &CanvasRenderingContext2d, s: &Scene) {
    let pink = "#ff9ebb";
    let pink_dark = "#ff6b9d";
    let pink_light = "#ffb3cc";
    let glass = "#c4e4f0";

    ctx.save();
    ctx.translate(s.car.0, s.car.1).ok();
    ctx.scale(s.scale, s.scale).ok();
    ctx.translate(0.0, s.car_bob).ok();

    // body
    ctx.set_fill_style_str(pink);
    ctx.set_stroke_style_str(pink_dark);
    ctx.set_line_width(2.0);
    polygon(
        ctx,
        &[
            (-42.0, 10.0),
            (-38.0, 14.0),
            (38.0, 14.0),
            (42.0, 10.0),
            (40.0, 6.0),
            (28.0, 4.0),
            (-20.0, 4.0),
            (-28.0, 8.0),
        ],
    );
    ctx.fill();
    ctx.stroke();

    // cabin
    ctx.set_fill_style_str(pink_light);
    polygon(
        ctx,
        &[(18.0, 4.0), (22.0, -14.0), (-8.0, -18.0), (-28.0, -8.0), (-28.0, 4.0)],
    );
    ctx.fill();
    ctx.stroke();

    // windshield + side window
    ctx.set_fill_style_str(glass);
    ctx.set_stroke_style_str("#8b9cb5");
    ctx.set_line_width(1.5);
    polygon(ctx, &[(16.0, 4.0), (20.0, -12.0), (-6.0, -16.0), (-24.0, 4.0)]);
    ctx.fill();
    ctx.stroke();
    polygon(ctx, &[(-24.0, 4.0), (-6.0, -16.0), (-22.0, -6.0), (-26.0, 4.0)]);
    ctx.fill();
    ctx.stroke();

    // wheels
    let (wheel_y, wheel_r, rim_r) = (14.0, 12.0, 5.0);
    for wx in [-26.0, 26.0] {
        ctx.set_fill_style_str("#2d3748");
        ctx.set_stroke_style_str("#1a202c");
        ctx.set_line_width(2.0);
        ctx.begin_path();
        ctx.ellipse(wx, wheel_y, wheel_r, wheel_r * 1.1, 0.0, 0.0, TAU).ok();
        ctx.fill();
        ctx.stroke();
        ctx.set_fill_style_str("#6b7280");
        ctx.begin_path();
        ctx.ellipse(wx, wheel_y, rim_r, rim_r * 1.1, 0.0, 0.0, TAU).ok();
        ctx.fill();
    }

    // grille + headlight
    ctx.set_fill_style_str("#1a202c");
    polygon(ctx, &[(38.0, 8.0), (42.0, 10.0), (42.0, 12.0), (38.0, 10.0)]);
    ctx.fill();
    ctx.set_stroke_style_str(pink_dark);
    ctx.stroke();
    ctx.set_fill_style_str("#fff8dc");
    ctx.begin_path();
    ctx.ellipse(40.0, 9.0, 4.0, 5.0, 0.0, 0.0, TAU).ok();
    ctx.fill();
    ctx.stroke();

    // rear spoiler
    ctx.set_fill_style_str(pink_dark);
    ctx.set_stroke_style_str("#e5558a");
    polygon(ctx, &[(-42.0, 6.0), (-46.0, 2.0), (-38.0, 2.0), (-38.0, 8.0)]);
    ctx.fill();
    ctx.stroke();

    ctx.restore();
}

fn line(ctx: &CanvasRenderingContext2d, x1: f64, y1: f64, x2: f64, y2: f64) {
    ctx.begin_path();
    ctx.move_to(x1, y1);
    ctx.line_to(x2, y2);
    ctx.stroke();
}
