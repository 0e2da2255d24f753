fn main() {
    #[cfg(feature = "gui")]
    {
        let config = slint_build::CompilerConfiguration::new()
            .with_include_paths(vec!["ui".into(), "ui/components".into()]);
        slint_build::compile_with_config("ui/app.slint", config)
            .expect("Failed to compile the Slint UI. Check the syntax in ui/app.slint.");
    }
}
