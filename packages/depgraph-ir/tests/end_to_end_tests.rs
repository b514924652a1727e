//! End-to-end: configuration file + serialized module → all three graphs

mod common;

use std::io::Write;

use common::*;
use depgraph_ir::features::read_write_graph::MemoryTarget;
use depgraph_ir::shared::models::{Module, Value};
use depgraph_ir::{
    AnalysisConfig, CdGranularity, ControlDependence, ControlDependenceAnalysis, Offset, ReadWriteGraphBuilder,
    SdgBuilder, StaticPointsTo,
};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"version: 1
control_dependence:
  granularity: instruction
read_write:
  strong_updates: false
sdg:
  entry_function: main
"#;

#[test]
fn test_config_file_drives_every_graph() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    let config = AnalysisConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.control_dependence.granularity, CdGranularity::Instruction);
    assert!(!config.read_write.strong_updates);

    let s = two_target_store();
    let module = Module::from_json(&s.module.to_json().unwrap()).unwrap();
    assert_eq!(module, s.module);

    let pta = StaticPointsTo::new().with(s.pointer, MemoryTarget::Object(s.a), Offset::ZERO);
    let rwg = ReadWriteGraphBuilder::new(&module, &pta, config.read_write.clone())
        .build()
        .unwrap();
    // strong updates disabled: the single precise target stays a may-def
    assert_eq!(rwg.get_node(&s.store).map(|n| n.defs.len()), Some(1));

    let sdg = SdgBuilder::new(&module, config.sdg.clone()).build().unwrap();
    assert_eq!(sdg.entry().map(|g| g.function()), Some(s.main));
    assert_eq!(sdg.get_dg(s.main).map(|g| g.nodes().len()), Some(6));

    let mut cda = ControlDependenceAnalysis::new(&module, config.control_dependence.clone());
    let Value::Inst(store) = s.store else {
        panic!("store is an instruction");
    };
    assert!(cda.instruction_dependencies(store).unwrap().is_empty());
    assert_eq!(cda.graph(s.main).map(|g| g.node_count()), Some(6));
}
