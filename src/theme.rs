use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Neutral colour reserved for the orphan tree.
    pub const fn grey() -> Self {
        Self::new(128, 128, 128)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Darker variant, used for connectors leaving finished entities.
    pub fn medium(self) -> Self {
        self.scale(0.6)
    }

    /// Washed-out variant, used for connectors leaving unfinished entities.
    pub fn greyed(self) -> Self {
        self.mix(Rgb::grey(), 0.75)
    }

    pub fn scale(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self::new(
            channel(self.r as f32 / 255.0 * f),
            channel(self.g as f32 / 255.0 * f),
            channel(self.b as f32 / 255.0 * f),
        )
    }

    pub fn mix(self, other: Rgb, amount: f32) -> Self {
        let t = amount.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| channel((a as f32 * (1.0 - t) + b as f32 * t) / 255.0);
        Self::new(lerp(self.r, other.r), lerp(self.g, other.g), lerp(self.b, other.b))
    }
}

fn channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// `h`, `s` and `v` are all in `0.0..=1.0`; a hue of 1.0 wraps to red.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);
    if s <= 0.0 {
        return Rgb::new(channel(v), channel(v), channel(v));
    }
    let h = h.rem_euclid(1.0) * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgb::new(channel(r), channel(g), channel(b))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub text_color: String,
    pub background: String,
    pub node_fill_opacity: f32,
    pub node_stroke_width: f32,
    pub band_opacity: f32,
    pub connector_width: f32,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 14.0,
            text_color: "#F0F0F0".to_string(),
            background: "#1E1E1E".to_string(),
            node_fill_opacity: 0.35,
            node_stroke_width: 1.6,
            band_opacity: 0.06,
            connector_width: 2.0,
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            text_color: "#1C2430".to_string(),
            background: "#FFFFFF".to_string(),
            node_fill_opacity: 0.18,
            node_stroke_width: 1.2,
            band_opacity: 0.05,
            connector_width: 1.6,
        }
    }
}
