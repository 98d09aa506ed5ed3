use crate::demo::DemoState;

/// Advances the demo by one frame and records the debug panel for `ui`.
pub fn update(state: &mut DemoState, ui: &imgui::Ui) {
    state.scene.early_update();

    let elapsed = state.elapsed();
    state.update(elapsed);
    state.controls.update(&mut state.camera);
    state.debug_panel.draw(ui, &mut state.scene);

    state.scene.late_update();
}
