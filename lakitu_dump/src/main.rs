//! A program for compiling a scene bundle into a layer-sorted draw list.
//!
//! The bundle is a JSON file holding geo layouts, display lists, vertex, light, and
//! texture tables, animations, a model table, and a list of object placements. The
//! output is either a short summary or the compiled draw list as JSON.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

use std::{path::Path, process};

use clap::{App, Arg};
use lakitu_geo::cmd::DrawLayer;
use lakitu_scene::{CompiledScene, SceneCompiler, SceneConfig};

use crate::bundle::{load_config, SceneBundle};

mod bundle;
mod logging;

fn main() {
    let matches = App::new("lakitu_dump")
        .about("Compiles a scene bundle into a draw list")
        .arg(
            Arg::with_name("bundle")
                .long("bundle")
                .value_name("FILE")
                .required(true)
                .help("path to the JSON scene bundle"),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .value_name("FILE")
                .help("path to a JSON compiler config"),
        )
        .arg(
            Arg::with_name("log")
                .long("log")
                .value_name("FILE")
                .help("append log output to this file"),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("print the compiled draw list as JSON"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("log debug events"),
        )
        .get_matches();

    logging::init(
        matches.value_of("log").map(Path::new),
        matches.is_present("verbose"),
    )
    .unwrap_or_else(|error| {
        eprintln!("Error while initializing logging: {}", error);
        process::exit(1);
    });

    let bundle_path = matches.value_of("bundle").unwrap_or_default();
    let bundle = SceneBundle::load(Path::new(bundle_path)).unwrap_or_else(|error| {
        eprintln!("Error while loading bundle: {}", error);
        process::exit(1);
    });

    let config = match matches.value_of("config") {
        Some(config_path) => load_config(Path::new(config_path)).unwrap_or_else(|error| {
            eprintln!("Error while loading config: {}", error);
            process::exit(1);
        }),
        None => SceneConfig::default(),
    };

    let compiler = SceneCompiler::new(&bundle.assets, &config);
    let scene = compiler.compile(&bundle.objects).unwrap_or_else(|error| {
        eprintln!("Error while compiling scene: {}", error);
        process::exit(1);
    });

    if matches.is_present("json") {
        let json = serde_json::to_string_pretty(&scene).unwrap_or_else(|error| {
            eprintln!("Error while serializing: {}", error);
            process::exit(1);
        });
        println!("{}", json);
    } else {
        print_summary(&bundle, &compiler, &scene);
    }
}

fn print_summary(bundle: &SceneBundle, compiler: &SceneCompiler<'_>, scene: &CompiledScene) {
    println!("objects:        {}", bundle.objects.len());
    println!("draw items:     {}", scene.items.len());
    println!("batches:        {}", scene.batch_count());
    println!("triangles:      {}", scene.triangle_count());
    println!("display lists:  {}", compiler.cached_display_lists());

    let lit = scene
        .items
        .iter()
        .flat_map(|item| item.batches.iter())
        .filter(|batch| batch.state.lighting())
        .count();
    let textured = scene
        .items
        .iter()
        .flat_map(|item| item.batches.iter())
        .filter(|batch| batch.state.uses_texture())
        .count();
    println!("lit batches:    {}", lit);
    println!("textured:       {}", textured);

    let layers = scene.layer_vertices();
    for layer in DrawLayer::ALL {
        let vertices = &layers[u8::from(layer) as usize];
        if !vertices.is_empty() {
            println!("  {:<20} {} triangles", layer, vertices.len() / 3);
        }
    }

    if !scene.skipped.is_empty() {
        println!("skipped:");
        for skipped in &scene.skipped {
            println!(
                "  object {} ({}): {}",
                skipped.object, skipped.model, skipped.reason
            );
        }
    }
}
