#![allow(dead_code)]

use std::path::Path;

/// Writes a skill entry into a registry tree.
pub fn write_skill(root: &Path, id: &str, version: &str, deps: &[(&str, &str)]) {
    write_skill_described(root, id, version, deps, &format!("{} skill", id), &[]);
}

pub fn write_skill_described(
    root: &Path,
    id: &str,
    version: &str,
    deps: &[(&str, &str)],
    description: &str,
    tags: &[&str],
) {
    let dir = root.join("skills").join(id);
    std::fs::create_dir_all(&dir).unwrap();

    let mut yaml = format!(
        "id: {id}\nname: {id}\nversion: {version}\ndescription: {description}\n"
    );
    if !tags.is_empty() {
        yaml.push_str("tags:\n");
        for tag in tags {
            yaml.push_str(&format!("  - {tag}\n"));
        }
    }
    if !deps.is_empty() {
        yaml.push_str("dependencies:\n");
        for (key, range) in deps {
            yaml.push_str(&format!("  {key}: '{range}'\n"));
        }
    }

    std::fs::write(dir.join("metadata.yaml"), yaml).unwrap();
    std::fs::write(dir.join("SKILL.md"), format!("# {id}\n\nbody of {id}\n")).unwrap();
}

/// Writes an agent entry, with explicit dependencies and implicit skills.
pub fn write_agent(root: &Path, id: &str, version: &str, deps: &[(&str, &str)], skills: &[&str]) {
    let dir = root.join("agents").join(id);
    std::fs::create_dir_all(&dir).unwrap();

    let mut yaml = format!(
        "id: {id}\nname: {id}\nversion: {version}\ndescription: {id} agent\n"
    );
    if !deps.is_empty() {
        yaml.push_str("dependencies:\n");
        for (key, range) in deps {
            yaml.push_str(&format!("  {key}: '{range}'\n"));
        }
    }
    if !skills.is_empty() {
        yaml.push_str("skills:\n");
        for skill in skills {
            yaml.push_str(&format!("  - {skill}\n"));
        }
    }

    std::fs::write(dir.join("metadata.yaml"), yaml).unwrap();
    std::fs::write(dir.join("AGENT.md"), format!("agent {id}\n")).unwrap();
}

/// Writes a plugin entry (metadata only, no content file).
pub fn write_plugin(root: &Path, id: &str, version: &str, skills: &[&str], agents: &[&str]) {
    let dir = root.join("plugins").join(id);
    std::fs::create_dir_all(&dir).unwrap();

    let mut yaml = format!(
        "id: {id}\nname: {id}\nversion: {version}\ndescription: {id} plugin\n"
    );
    if !skills.is_empty() || !agents.is_empty() {
        yaml.push_str("dependencies:\n");
        for skill in skills {
            yaml.push_str(&format!("  skill:{skill}: '*'\n"));
        }
        for agent in agents {
            yaml.push_str(&format!("  agent:{agent}: '*'\n"));
        }
    }

    std::fs::write(dir.join("metadata.yaml"), yaml).unwrap();
}
