use anyhow::{bail, Context};
use imgui::{Condition, TreeNodeFlags};

use crate::scene_graph::{light::LightProperty, object3d::ObjectId, scene::Scene};

/// A slider editing one numeric property of a light.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderBinding {
    pub target: ObjectId,
    pub property: LightProperty,
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub label: String,
}

impl SliderBinding {
    pub fn name(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = label.into();
        self
    }

    /// Rounds to the nearest step, then clamps into range.
    pub fn snap(&self, value: f32) -> f32 {
        ((value / self.step).round() * self.step).clamp(self.min, self.max)
    }

    fn display_format(&self) -> String {
        let decimals = (-self.step.log10()).round().max(0.0) as usize;
        format!("%.{}f", decimals)
    }
}

#[derive(Debug, Default)]
pub struct Folder {
    pub name: Option<String>,
    pub bindings: Vec<SliderBinding>,
}

impl Folder {
    /// Registers a slider. Fails if the light doesn't have `property` or the range is empty.
    pub fn add(
        &mut self,
        scene: &Scene,
        target: ObjectId,
        property: LightProperty,
        min: f32,
        max: f32,
        step: f32,
    ) -> anyhow::Result<&mut SliderBinding> {
        let light = scene
            .light(target)
            .context("Debug panel target is not a light")?;

        if light.property(property).is_none() {
            bail!(
                "{} light has no property named {}",
                light.kind_name(),
                property
            );
        }
        if !(min < max) {
            bail!("Empty slider range {}..{} for {}", min, max, property);
        }
        if !(step > 0.0) {
            bail!("Slider step for {} must be positive, got {}", property, step);
        }

        self.bindings.push(SliderBinding {
            target,
            property,
            min,
            max,
            step,
            label: property.name().to_string(),
        });

        let index = self.bindings.len() - 1;
        Ok(&mut self.bindings[index])
    }
}

/// Live sliders for light properties, drawn as a single imgui window.
pub struct DebugPanel {
    title: String,
    width: f32,
    root: Folder,
    folders: Vec<Folder>,
}

impl DebugPanel {
    pub fn new(title: impl Into<String>, width: f32) -> Self {
        Self {
            title: title.into(),
            width,
            root: Folder::default(),
            folders: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn add(
        &mut self,
        scene: &Scene,
        target: ObjectId,
        property: LightProperty,
        min: f32,
        max: f32,
        step: f32,
    ) -> anyhow::Result<&mut SliderBinding> {
        self.root.add(scene, target, property, min, max, step)
    }

    pub fn add_folder(&mut self, name: impl Into<String>) -> &mut Folder {
        self.folders.push(Folder {
            name: Some(name.into()),
            bindings: Vec::new(),
        });
        let index = self.folders.len() - 1;
        &mut self.folders[index]
    }

    pub fn folders(&self) -> impl Iterator<Item = &Folder> {
        std::iter::once(&self.root).chain(self.folders.iter())
    }

    pub fn bindings(&self) -> impl Iterator<Item = &SliderBinding> {
        self.folders().flat_map(|folder| folder.bindings.iter())
    }

    pub fn find(&self, target: ObjectId, property: LightProperty) -> Option<&SliderBinding> {
        self.bindings()
            .find(|binding| binding.target == target && binding.property == property)
    }

    /// Draws the panel and writes slider edits back into the scene.
    pub fn draw(&self, ui: &imgui::Ui, scene: &mut Scene) {
        ui.window(self.title())
            .size([self.width(), 0.0], Condition::FirstUseEver)
            .position([10.0, 10.0], Condition::FirstUseEver)
            .build(|| {
                draw_bindings(ui, &self.root.bindings, scene);

                for folder in &self.folders {
                    let name = folder.name.as_deref().unwrap_or_default();
                    if ui.collapsing_header(name, TreeNodeFlags::DEFAULT_OPEN) {
                        // Several folders have sliders with the same label
                        let _id = ui.push_id(name);
                        draw_bindings(ui, &folder.bindings, scene);
                    }
                }
            });
    }
}

fn draw_bindings(ui: &imgui::Ui, bindings: &[SliderBinding], scene: &mut Scene) {
    for binding in bindings {
        let Some(value) = scene
            .light_mut(binding.target)
            .and_then(|light| light.property_mut(binding.property))
        else {
            continue;
        };

        let mut edited = *value;
        if ui
            .slider_config(&binding.label, binding.min, binding.max)
            .display_format(binding.display_format())
            .build(&mut edited)
        {
            *value = binding.snap(edited);
        }
    }
}
