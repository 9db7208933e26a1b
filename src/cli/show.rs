use std::path::PathBuf;

use clap::Parser;
use serde_json::{json, Value};
use tracing::instrument;
use volet::{
    domain::{
        stats::{building_stats, favorites_first, project_stats, select_zones_for_display, zone_stats},
        Building, CompartmentZone, FunctionalZone, Shutter, ZoneSelection, ZoneTab,
    },
    Favorites, Project, Store,
};

use super::{
    deviation_label,
    terminal::{paint_status, Colorize},
    OutputFormat,
};

#[derive(Debug, Parser)]
#[command(about = "Display a project with the result of every shutter")]
pub struct Show {
    /// The identifier of the project to display
    project: String,

    /// Which zones to show for complete-mode projects
    #[arg(long, value_name = "TAB", default_value = "smoke")]
    tab: Tab,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum Tab {
    #[default]
    Smoke,
    Compartment,
}

impl From<Tab> for ZoneTab {
    fn from(tab: Tab) -> Self {
        match tab {
            Tab::Smoke => Self::Smoke,
            Tab::Compartment => Self::Compartment,
        }
    }
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;

        let Some(project) = store.project(&self.project) else {
            anyhow::bail!("Project {} not found", self.project);
        };

        match self.output {
            OutputFormat::Table => self.output_table(project, store.favorites()),
            OutputFormat::Json => {
                let output = self.to_json(project, store.favorites());
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Ok(())
    }

    fn output_table(&self, project: &Project, favorites: &Favorites) {
        let stats = project_stats(project);

        println!("{}", project.name.strong());
        println!(
            "{}",
            format!(
                "{} · {} · {}",
                project.mode,
                project.city.as_deref().unwrap_or("-"),
                project.id
            )
            .dim()
        );
        println!(
            "{} buildings, {} zones, {} shutters, {:.1}% compliant",
            stats.building_count, stats.zone_count, stats.shutter_count, stats.compliance_rate
        );

        for building in favorites_first(&project.buildings, &favorites.buildings) {
            let stats = building_stats(building);
            println!();
            println!(
                "{}{}  {}",
                star(favorites.buildings.contains(building.id.as_str())),
                building.name.strong(),
                format!("{} shutters, {:.1}%", stats.shutter_count, stats.compliance_rate).dim()
            );

            match select_zones_for_display(building, project.mode, self.tab.into()) {
                ZoneSelection::Functional(zones) => {
                    for zone in favorites_first(zones, &favorites.zones) {
                        print_zone(zone, favorites);
                    }
                }
                ZoneSelection::Compartment(zones) => {
                    for zone in zones {
                        print_compartment_zone(zone);
                    }
                }
            }
        }
    }

    fn to_json(&self, project: &Project, favorites: &Favorites) -> Value {
        let buildings: Vec<_> = favorites_first(&project.buildings, &favorites.buildings)
            .into_iter()
            .map(|building| self.building_json(project, building, favorites))
            .collect();
        json!({
            "id": project.id,
            "name": project.name,
            "mode": project.mode,
            "city": project.city,
            "stats": project_stats(project),
            "buildings": buildings,
        })
    }

    fn building_json(&self, project: &Project, building: &Building, favorites: &Favorites) -> Value {
        let zones: Vec<_> = match select_zones_for_display(building, project.mode, self.tab.into())
        {
            ZoneSelection::Functional(zones) => favorites_first(zones, &favorites.zones)
                .into_iter()
                .map(|zone| {
                    json!({
                        "id": zone.id,
                        "name": zone.name,
                        "stats": zone_stats(zone),
                        "shutters": favorites_first(&zone.shutters, &favorites.shutters)
                            .into_iter()
                            .map(shutter_json)
                            .collect::<Vec<_>>(),
                    })
                })
                .collect(),
            ZoneSelection::Compartment(zones) => zones
                .iter()
                .map(|zone| {
                    json!({
                        "id": zone.id,
                        "name": zone.name,
                        "devices": zone.devices,
                    })
                })
                .collect(),
        };
        json!({
            "id": building.id,
            "name": building.name,
            "stats": building_stats(building),
            "zones": zones,
        })
    }
}

const fn star(favorite: bool) -> &'static str {
    if favorite { "★ " } else { "" }
}

fn print_zone(zone: &FunctionalZone, favorites: &Favorites) {
    let stats = zone_stats(zone);
    println!(
        "  {}{}  {}",
        star(favorites.zones.contains(zone.id.as_str())),
        zone.name,
        format!("{}/{} compliant", stats.compliant_count, stats.shutter_count).dim()
    );
    if zone.shutters.is_empty() {
        println!("    {}", "no shutters".dim());
    }
    for shutter in favorites_first(&zone.shutters, &favorites.shutters) {
        print_shutter(shutter, favorites.shutters.contains(shutter.id.as_str()));
    }
}

fn print_shutter(shutter: &Shutter, favorite: bool) {
    let result = shutter.compliance();
    println!(
        "    {}{:<16} {:<2} {:>8.1} → {:>8.1} m³/h  {:>7}  {}  {}",
        star(favorite),
        shutter.name,
        shutter.kind.label(),
        shutter.reference_flow,
        shutter.measured_flow,
        deviation_label(&result),
        paint_status(result.label, result.status),
        shutter.id.as_str().dim()
    );
    if let Some(remarks) = &shutter.remarks {
        println!("      {}", remarks.dim());
    }
}

fn print_compartment_zone(zone: &CompartmentZone) {
    println!(
        "  {}  {}",
        zone.name,
        format!("{} devices", zone.devices.len()).dim()
    );
    for device in &zone.devices {
        println!("    {:<16} {}", device.name, device.kind.label());
    }
}

fn shutter_json(shutter: &Shutter) -> Value {
    json!({
        "id": shutter.id,
        "name": shutter.name,
        "type": shutter.kind,
        "referenceFlow": shutter.reference_flow,
        "measuredFlow": shutter.measured_flow,
        "remarks": shutter.remarks,
        "result": shutter.compliance(),
    })
}
