// Smartmark services
// Stateless helpers around the application core: configuration loading.

pub mod settings_engine;
