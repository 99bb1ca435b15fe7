pub mod resolve_id_with_plugins;
