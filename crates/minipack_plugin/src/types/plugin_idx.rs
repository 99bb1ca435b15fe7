oxc_index::define_index_type! {
  #[derive(Default)]
  pub struct PluginIdx = u32;
}
