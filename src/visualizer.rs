use std::collections::HashMap;

use color_eyre::eyre::{eyre, Result};
use eframe::{run_native, App, CreationContext, NativeOptions};
use egui::Color32;
use egui_graphs::{
    DefaultGraphView, Graph, SettingsInteraction, SettingsNavigation, SettingsStyle,
};
use petgraph::{graph::EdgeIndex, graph::NodeIndex, prelude::StableGraph};

use crate::fa::FA;

struct Visualizer {
    graph: Graph,
}

impl Visualizer {
    fn new(_: &CreationContext<'_>, graph: Graph) -> Self {
        Visualizer { graph }
    }
}

impl App for Visualizer {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let navigation_settings = &SettingsNavigation::new()
                .with_zoom_and_pan_enabled(true)
                .with_fit_to_screen_enabled(true);
            let interactive_settings = &SettingsInteraction::new()
                .with_dragging_enabled(true)
                .with_node_clicking_enabled(true)
                .with_node_selection_enabled(true)
                .with_edge_clicking_enabled(true)
                .with_edge_selection_enabled(true);
            let style_settings = &SettingsStyle::default().with_labels_always(true);
            ui.add(
                &mut DefaultGraphView::new(&mut self.graph)
                    .with_styles(style_settings)
                    .with_interactions(interactive_settings)
                    .with_navigations(navigation_settings),
            );
        });
    }
}

type EdgeLabels = HashMap<(NodeIndex, NodeIndex), (EdgeIndex, Vec<String>)>;

// egui_graphs draws a single edge per node pair, so parallel transitions share one edge and get
// their symbols joined in its label
fn collect_edges<T: FA>(fa: &T) -> (StableGraph<(), ()>, EdgeLabels) {
    let mut stable_graph = StableGraph::new();
    let mut edge_labels: EdgeLabels = HashMap::new();

    let num_states = fa.get_num_states();

    for _state_idx in 0..num_states {
        stable_graph.add_node(());
    }

    for state_idx in 0..num_states {
        for (symbol, target) in fa.get_state_transitions(state_idx) {
            let key = (NodeIndex::new(state_idx), NodeIndex::new(*target));

            edge_labels
                .entry(key)
                .or_insert_with(|| (stable_graph.add_edge(key.0, key.1, ()), Vec::new()))
                .1
                .push(symbol.to_string());
        }
    }

    (stable_graph, edge_labels)
}

fn generate_stable_graph<T: FA>(fa: &T) -> Graph {
    let (stable_graph, edge_labels) = collect_edges(fa);

    let start_node_color = Color32::from_rgb(20, 67, 130);
    let accept_node_color = Color32::from_rgb(20, 130, 90);

    let mut graph = Graph::from(&stable_graph);

    for state_idx in 0..fa.get_num_states() {
        let is_start = state_idx == fa.get_start_state();
        let is_accept = fa.get_acceptor_states()[state_idx];

        let node_label = match (is_start, is_accept) {
            (true, true) => format!("Start/Accept {}", state_idx),
            (true, false) => format!("Start {}", state_idx),
            (false, true) => format!("Accept {}", state_idx),
            (false, false) => format!("State {}", state_idx),
        };

        if let Some(node) = graph.node_mut(NodeIndex::new(state_idx)) {
            node.set_label(node_label);
            if is_start {
                node.set_color(start_node_color);
            } else if is_accept {
                node.set_color(accept_node_color);
            }
        }
    }

    for (edge_idx, labels) in edge_labels.into_values() {
        if let Some(edge) = graph.edge_mut(edge_idx) {
            edge.set_label(labels.join(", "));
        }
    }

    graph
}

/// Opens an interactive window showing the automaton. Blocks until the window is closed.
pub fn visualize<T: FA>(fa: &T) -> Result<()> {
    let graph = generate_stable_graph(fa);
    run_native(
        "finite automata visualizer",
        NativeOptions::default(),
        Box::new(|cc| Ok(Box::new(Visualizer::new(cc, graph)))),
    )
    .map_err(|err| eyre!("Failed to open the visualizer window: {}", err))
}
