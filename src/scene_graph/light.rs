use std::fmt;

use glam::Vec3;

use crate::color::Color;

#[derive(Debug, Clone)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// Parallel rays travelling from the light's position towards `target`.
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub target: Vec3,
}

/// Sky color from above, ground color from below, blended by the surface normal.
#[derive(Debug, Clone)]
pub struct HemisphereLight {
    pub sky_color: Color,
    pub ground_color: Color,
    pub intensity: f32,
}

#[derive(Debug, Clone)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    /// Cutoff distance, 0 means unlimited.
    pub distance: f32,
    pub decay: f32,
}

/// Emits from the front face of a `width` x `height` rectangle. The rectangle faces
/// the object's local -Z axis, so orient it with `Transform::look_at`.
#[derive(Debug, Clone)]
pub struct RectAreaLight {
    pub color: Color,
    pub intensity: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct SpotLight {
    pub color: Color,
    pub intensity: f32,
    pub distance: f32,
    /// Half-angle of the cone in radians, at most PI / 2.
    pub angle: f32,
    /// Fraction of the cone that fades out, 0 gives a hard edge.
    pub penumbra: f32,
    pub decay: f32,
    pub target: Vec3,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            distance: 0.0,
            decay: 2.0,
        }
    }
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            distance: 0.0,
            angle: std::f32::consts::FRAC_PI_3,
            penumbra: 0.0,
            decay: 2.0,
            target: Vec3::ZERO,
        }
    }
}

impl SpotLight {
    pub fn cone_cos(&self) -> f32 {
        self.angle.min(std::f32::consts::FRAC_PI_2).cos()
    }

    pub fn penumbra_cos(&self) -> f32 {
        (self.angle * (1.0 - self.penumbra.clamp(0.0, 1.0))).cos()
    }
}

#[derive(Debug, Clone)]
pub enum Light {
    Ambient(AmbientLight),
    Directional(DirectionalLight),
    Hemisphere(HemisphereLight),
    Point(PointLight),
    RectArea(RectAreaLight),
    Spot(SpotLight),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightProperty {
    Intensity,
    Distance,
    Decay,
    Angle,
    Penumbra,
    Width,
    Height,
}

impl LightProperty {
    pub fn name(self) -> &'static str {
        match self {
            LightProperty::Intensity => "intensity",
            LightProperty::Distance => "distance",
            LightProperty::Decay => "decay",
            LightProperty::Angle => "angle",
            LightProperty::Penumbra => "penumbra",
            LightProperty::Width => "width",
            LightProperty::Height => "height",
        }
    }
}

impl fmt::Display for LightProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Light {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Light::Ambient(_) => "ambient",
            Light::Directional(_) => "directional",
            Light::Hemisphere(_) => "hemisphere",
            Light::Point(_) => "point",
            Light::RectArea(_) => "rect area",
            Light::Spot(_) => "spot",
        }
    }

    /// Main color. For hemisphere lights this is the sky color.
    pub fn color(&self) -> Color {
        match self {
            Light::Ambient(light) => light.color,
            Light::Directional(light) => light.color,
            Light::Hemisphere(light) => light.sky_color,
            Light::Point(light) => light.color,
            Light::RectArea(light) => light.color,
            Light::Spot(light) => light.color,
        }
    }

    pub fn intensity(&self) -> f32 {
        match self {
            Light::Ambient(light) => light.intensity,
            Light::Directional(light) => light.intensity,
            Light::Hemisphere(light) => light.intensity,
            Light::Point(light) => light.intensity,
            Light::RectArea(light) => light.intensity,
            Light::Spot(light) => light.intensity,
        }
    }

    pub fn property(&self, property: LightProperty) -> Option<f32> {
        use LightProperty as P;

        match (self, property) {
            (_, P::Intensity) => Some(self.intensity()),
            (Light::Point(light), P::Distance) => Some(light.distance),
            (Light::Point(light), P::Decay) => Some(light.decay),
            (Light::RectArea(light), P::Width) => Some(light.width),
            (Light::RectArea(light), P::Height) => Some(light.height),
            (Light::Spot(light), P::Distance) => Some(light.distance),
            (Light::Spot(light), P::Decay) => Some(light.decay),
            (Light::Spot(light), P::Angle) => Some(light.angle),
            (Light::Spot(light), P::Penumbra) => Some(light.penumbra),
            _ => None,
        }
    }

    pub fn property_mut(&mut self, property: LightProperty) -> Option<&mut f32> {
        use LightProperty as P;

        match (self, property) {
            (Light::Ambient(light), P::Intensity) => Some(&mut light.intensity),
            (Light::Directional(light), P::Intensity) => Some(&mut light.intensity),
            (Light::Hemisphere(light), P::Intensity) => Some(&mut light.intensity),
            (Light::Point(light), P::Intensity) => Some(&mut light.intensity),
            (Light::Point(light), P::Distance) => Some(&mut light.distance),
            (Light::Point(light), P::Decay) => Some(&mut light.decay),
            (Light::RectArea(light), P::Intensity) => Some(&mut light.intensity),
            (Light::RectArea(light), P::Width) => Some(&mut light.width),
            (Light::RectArea(light), P::Height) => Some(&mut light.height),
            (Light::Spot(light), P::Intensity) => Some(&mut light.intensity),
            (Light::Spot(light), P::Distance) => Some(&mut light.distance),
            (Light::Spot(light), P::Decay) => Some(&mut light.decay),
            (Light::Spot(light), P::Angle) => Some(&mut light.angle),
            (Light::Spot(light), P::Penumbra) => Some(&mut light.penumbra),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_exist_only_on_matching_kinds() {
        let mut ambient = Light::Ambient(AmbientLight {
            color: Color::WHITE,
            intensity: 0.5,
        });
        assert_eq!(ambient.property(LightProperty::Intensity), Some(0.5));
        assert!(ambient.property_mut(LightProperty::Distance).is_none());

        let mut spot = Light::Spot(SpotLight::default());
        *spot.property_mut(LightProperty::Penumbra).unwrap() = 0.25;
        assert_eq!(spot.property(LightProperty::Penumbra), Some(0.25));
        assert!(spot.property(LightProperty::Width).is_none());
    }

    #[test]
    fn spot_penumbra_widens_the_fade() {
        let spot = SpotLight {
            angle: 0.5,
            penumbra: 0.5,
            ..Default::default()
        };

        assert_eq!(spot.cone_cos(), 0.5f32.cos());
        assert_eq!(spot.penumbra_cos(), 0.25f32.cos());
        assert!(spot.penumbra_cos() > spot.cone_cos());
    }
}
