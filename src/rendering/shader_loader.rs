use std::{
    path::Path,
    sync::{
        mpsc::{self, channel},
        Arc, RwLock,
    },
    time::Duration,
};

use anyhow::Context;
use id_arena::{Arena, Id};
use naga::{
    back::wgsl::WriterFlags,
    valid::{Capabilities, ValidationFlags},
};
use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage,
};
use notify_debouncer_mini::{
    new_debouncer_opt, notify::*, DebounceEventResult, DebouncedEventKind, Debouncer,
};
use pollster::block_on;
use wgpu::PollType;

const SHADER_FOLDER: &str = "assets/shaders";
const SHARED_SHADER_MODULES_FOLDER: &str = "assets/shaders/shared";

pub type PipelineFactory = Box<
    dyn Sync
        + Send
        + Fn(&wgpu::Device, &ShaderDefinition, &str) -> anyhow::Result<wgpu::RenderPipeline>,
>;

#[derive(Debug, Clone)]
pub struct ShaderDefinition {
    pub name: &'static str,
    pub path: &'static str,
}

pub struct ShaderEntry {
    pipeline_id: PipelineId,
    def: ShaderDefinition,
    factory: PipelineFactory,
}

pub type PipelineId = Id<PipelineCacheEntry>;

#[derive(Default)]
pub struct PipelineCacheEntry(Option<wgpu::RenderPipeline>);

impl PipelineCacheEntry {
    pub fn set_pipeline(&mut self, pipeline: wgpu::RenderPipeline) {
        self.0 = Some(pipeline);
    }
}

pub struct PipelineCacheBuilder {
    shaders: Arena<ShaderEntry>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCacheBuilder {
    pub fn new() -> Self {
        Self {
            shaders: Arena::new(),
            pipelines: Arena::new(),
        }
    }

    pub fn add_shader(
        &mut self,
        shader_def: ShaderDefinition,
        factory: PipelineFactory,
    ) -> PipelineId {
        let pipeline_id = self.pipelines.alloc(PipelineCacheEntry::default());
        self.shaders.alloc(ShaderEntry {
            pipeline_id,
            def: shader_def,
            factory,
        });
        pipeline_id
    }

    pub fn build(self) -> PipelineCache {
        PipelineCache {
            shaders: Arc::new(self.shaders),
            pipelines: self.pipelines,
        }
    }
}

pub struct PipelineCache {
    shaders: Arc<Arena<ShaderEntry>>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCache {
    pub fn get(&self, id: PipelineId) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(id).and_then(|entry| entry.0.as_ref())
    }

    fn get_entry_mut(&mut self, id: PipelineId) -> Option<&mut PipelineCacheEntry> {
        self.pipelines.get_mut(id)
    }
}

/// Compiles every registered shader up front, then recompiles changed files on a watcher
/// thread. Recompiled pipelines are swapped in by `load_pending_shaders`.
pub struct ShaderLoader {
    pub cache: PipelineCache,
    receiver: mpsc::Receiver<(&'static str, PipelineId, wgpu::RenderPipeline)>,
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl ShaderLoader {
    pub fn new(device: wgpu::Device, cache_builder: PipelineCacheBuilder) -> anyhow::Result<Self> {
        let mut cache = cache_builder.build();

        let composer = create_composer().context("Failed to create shader composer")?;
        let composer = Arc::new(RwLock::new(composer));

        for (_, shader) in cache.shaders.clone().iter() {
            let pipeline = compile_file(&device, &shader.def, &shader.factory, &composer)
                .with_context(|| format!("Failed to compile shader: {}", shader.def.name))?;

            if let Some(entry) = cache.get_entry_mut(shader.pipeline_id) {
                entry.set_pipeline(pipeline);
            }
        }

        let (send_new_pipelines, receiver) = channel();
        let shaders = cache.shaders.clone();

        let mut debouncer = new_debouncer_opt(
            notify_debouncer_mini::Config::default().with_timeout(Duration::from_millis(100)),
            move |res: DebounceEventResult| match res {
                Ok(events) => {
                    for event in events {
                        if event.kind != DebouncedEventKind::Any {
                            continue;
                        }

                        // Shared modules are only read when the composer is created
                        let Some(entry) = shaders
                            .iter()
                            .map(|(_, entry)| entry)
                            .find(|entry| event.path.ends_with(entry.def.path))
                        else {
                            continue;
                        };

                        match compile_file(&device, &entry.def, &entry.factory, &composer) {
                            Ok(pipeline) => {
                                let message = (entry.def.name, entry.pipeline_id, pipeline);
                                if send_new_pipelines.send(message).is_err() {
                                    return;
                                }
                            }
                            Err(e) => log::error!("Failed to reload shader: {:?}", e),
                        }
                    }
                }
                Err(e) => log::error!("Error debouncing shader changes: {}", e),
            },
        )
        .context("Failed to create shader file watcher")?;

        let absolute_shader_folder = Path::new(SHADER_FOLDER)
            .canonicalize()
            .with_context(|| format!("Shader folder {} not found", SHADER_FOLDER))?;

        debouncer
            .watcher()
            .watch(&absolute_shader_folder, RecursiveMode::Recursive)
            .context("Failed to watch shader folder")?;

        Ok(Self {
            cache,
            receiver,
            _debouncer: debouncer,
        })
    }

    pub fn load_pending_shaders(&mut self) {
        while let Ok((name, pipeline_id, pipeline)) = self.receiver.try_recv() {
            if let Some(entry) = self.cache.get_entry_mut(pipeline_id) {
                log::info!("Shader reloaded: {}", name);
                entry.set_pipeline(pipeline);
            }
        }
    }
}

fn compile_file(
    device: &wgpu::Device,
    shader_def: &ShaderDefinition,
    factory: &PipelineFactory,
    composer: &RwLock<Composer>,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let path = Path::new(SHADER_FOLDER).join(shader_def.path);
    let shader_code = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read shader file {}", path.display()))?;

    let file_path = path.to_string_lossy().to_string();

    let module = {
        let mut composer = composer
            .write()
            .map_err(|_| anyhow::anyhow!("Shader composer lock poisoned"))?;

        composer
            .make_naga_module(NagaModuleDescriptor {
                file_path: &file_path,
                source: &shader_code,
                ..Default::default()
            })
            .context("Failed to create Naga module from shader code")?
    };

    // wgpu validates again when the pipeline is created, this pass only feeds the WGSL writer.
    let info = naga::valid::Validator::new(ValidationFlags::empty(), Capabilities::all())
        .validate(&module)
        .context("Failed to validate Naga module")?;

    let shader_code = naga::back::wgsl::write_string(&module, &info, WriterFlags::empty())
        .context("Failed to convert Naga module to WGSL string")?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let pipeline = factory(device, shader_def, &shader_code);

    device
        .poll(PollType::Wait)
        .context("Failed to poll device after shader compilation")?;

    if let Some(error) = block_on(device.pop_error_scope()) {
        anyhow::bail!("Shader compilation failed for {}: {}", shader_def.name, error);
    }

    pipeline
}

fn create_composer() -> anyhow::Result<Composer> {
    let shared_files = std::fs::read_dir(SHARED_SHADER_MODULES_FOLDER).with_context(|| {
        format!(
            "Failed to read shared shader modules from {}",
            SHARED_SHADER_MODULES_FOLDER
        )
    })?;

    let mut composer = Composer::default();

    for entry in shared_files {
        let path = entry?.path();

        if !path.is_file() || path.extension().map_or(true, |ext| ext != "wgsl") {
            continue;
        }

        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_path = path.to_string_lossy().to_string();

        composer
            .add_composable_module(ComposableModuleDescriptor {
                source: &source,
                file_path: &file_path,
                language: ShaderLanguage::Wgsl,
                ..Default::default()
            })
            .with_context(|| format!("Failed to add shared shader module: {}", file_path))?;

        log::debug!("Loaded shared shader module {}", file_path);
    }

    Ok(composer)
}
