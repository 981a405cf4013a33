use super::load_project;
use crate::cli::InspectArgs;
use crate::error::Result;
use fieldlines::core::models::project::Project;
use std::fmt::Write;

pub async fn run(args: InspectArgs) -> Result<()> {
    let project = load_project(&args.input)?;
    print!("{}", describe(&project));
    Ok(())
}

fn describe(project: &Project) -> String {
    let mut out = String::new();
    if project.is_empty() {
        out.push_str("Project has no simulations.\n");
        return out;
    }

    for (index, (id, simulation)) in project.iter().enumerate() {
        let marker = if project.is_active(id) { "*" } else { " " };
        let settings = &simulation.settings;
        let _ = writeln!(
            out,
            "{} [{}] {} ({} x {}), {} charge(s)",
            marker,
            index,
            simulation.name,
            simulation.width,
            simulation.height,
            simulation.charges().len()
        );
        let _ = writeln!(
            out,
            "      settings: r={} density={} steps={} delta={} magnitude={}",
            settings.r, settings.density, settings.steps, settings.delta, settings.magnitude
        );
        for entry in simulation.charges().iter() {
            let charge = &entry.charge;
            let params = &entry.field.params;
            let _ = writeln!(
                out,
                "      {} at ({:.1}, {:.1}) magnitude {:+.2}{} | r={} density={} steps={} delta={}",
                charge.id,
                charge.position.x,
                charge.position.y,
                charge.magnitude,
                if charge.is_selected() { " [selected]" } else { "" },
                params.r,
                params.density,
                params.steps,
                params.delta
            );
        }
    }
    out
}
